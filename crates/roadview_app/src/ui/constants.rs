pub const ACTIVE_CURSOR: char = '>';
pub const SHORT_ID_WIDTH: usize = 8;
pub const FILENAME_WIDTH: usize = 32;
pub const BAR_WIDTH: usize = 21;

pub const RESULT_PLACEHOLDER: &str = "select a completed job to view its result";
/// Colours of the overlay drawn into processed videos.
pub const LEGEND: &str = "green = lane area, blue = lane lines";
