pub mod input_dir;
pub mod reading_csv_file;

pub use input_dir::discover_csv_sources;
pub use reading_csv_file::ReadingCsvFileSource;
