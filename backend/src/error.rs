use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("route catalog references a symbol outside the universe: {0}")]
    UnknownSymbol(String),

    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },
}
