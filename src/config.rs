//! Export options and memory profiles

/// Default sheet name
pub const DEFAULT_SHEET_NAME: &str = "Export";
/// Default number of rows kept in memory before older rows are flushed
pub const DEFAULT_FLUSH_THRESHOLD: usize = 500;

/// Layout and buffering options for one export
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    /// Name of the first worksheet
    pub sheet_name: String,
    /// Rows held in memory before the oldest are written out
    pub flush_threshold: usize,
    /// Height of the title row in points
    pub title_row_height: f64,
    /// Height of the header row in points
    pub header_row_height: f64,
    /// Width of every plan column, in characters
    pub column_width: f64,
    /// Font used by all generated styles
    pub font_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            title_row_height: 30.0,
            header_row_height: 16.0,
            column_width: 16.0,
            font_name: "Arial".to_string(),
        }
    }
}

/// Memory profile for different deployment sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryProfile {
    /// Small pods (< 512MB): keep 100 rows in memory
    Low,
    /// Medium pods (512MB-1GB): keep 500 rows in memory
    Medium,
    /// Large pods (> 1GB): keep 1000 rows in memory
    High,
    /// Custom window size
    Custom { flush_threshold: usize },
}

impl MemoryProfile {
    /// Pick a profile from a memory limit in MB
    pub fn from_memory_mb(memory_mb: usize) -> Self {
        if memory_mb < 512 {
            MemoryProfile::Low
        } else if memory_mb < 1024 {
            MemoryProfile::Medium
        } else {
            MemoryProfile::High
        }
    }

    /// Detect from the MEMORY_LIMIT_MB environment variable
    pub fn from_env() -> Self {
        std::env::var("MEMORY_LIMIT_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .map(Self::from_memory_mb)
            .unwrap_or(MemoryProfile::Medium)
    }

    /// Window size for this profile
    pub fn flush_threshold(&self) -> usize {
        match self {
            MemoryProfile::Low => 100,
            MemoryProfile::Medium => DEFAULT_FLUSH_THRESHOLD,
            MemoryProfile::High => 1000,
            MemoryProfile::Custom { flush_threshold } => *flush_threshold,
        }
    }

    /// Apply this profile to a set of options
    pub fn apply(&self, options: &mut ExportOptions) {
        options.flush_threshold = self.flush_threshold();
    }
}
