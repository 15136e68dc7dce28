//! Canonical file paths for the score data directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ECOPULSE_DATA_DIR";

/// Data directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Monthly average scores per city.
pub const MONTHLY_FILE: &str = "EcoPulse_Skorlari_AYLIK_2020-2025_Temizlenmis.csv";

/// Quarterly forecast scores per city.
pub const FORECAST_FILE: &str = "EcoPulse_2027_Tahminleri_2020-2025_Verisiyle.csv";

/// Daily observations per city.
pub const DAILY_FILE: &str = "EcoPulse_Skorlari_GUNLUK_2020-2025_Temizlenmis.csv";

/// Returns the data directory: `$ECOPULSE_DATA_DIR`, or `data/` relative
/// to the working directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

/// Returns the monthly scores CSV path inside `dir`.
#[must_use]
pub fn monthly_csv(dir: &Path) -> PathBuf {
    dir.join(MONTHLY_FILE)
}

/// Returns the forecast CSV path inside `dir`.
#[must_use]
pub fn forecast_csv(dir: &Path) -> PathBuf {
    dir.join(FORECAST_FILE)
}

/// Returns the daily observations CSV path inside `dir`.
#[must_use]
pub fn daily_csv(dir: &Path) -> PathBuf {
    dir.join(DAILY_FILE)
}
