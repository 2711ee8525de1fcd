pub mod submit;

pub use submit::{
    StorageDestinationInput, SubmitDownloadCommand, SubmitDownloadError, SubmitDownloadResponse,
};
