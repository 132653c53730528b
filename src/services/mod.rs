pub mod autosave;
pub mod export;
pub mod object_url;
pub mod raster;
pub mod session;
