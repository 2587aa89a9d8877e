use tokio::io::AsyncWriteExt;

use crate::error::SinkError;

/// Read an input file into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn read_input(path: &str) -> Result<Vec<u8>, SinkError> {
    tokio::fs::read(path)
        .await
        .map_err(|err| SinkError::ReadInput {
            path: path.to_owned(),
            source: err,
        })
}

/// Write rendered bytes to `path`, or to stdout when no path is given.
///
/// # Errors
///
/// Returns an error if the destination cannot be written.
pub async fn write_output(path: Option<&str>, bytes: &[u8]) -> Result<(), SinkError> {
    match path {
        Some(path) => tokio::fs::write(path, bytes)
            .await
            .map_err(|err| SinkError::WriteOutput {
                path: path.to_owned(),
                source: err,
            }),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(bytes)
                .await
                .map_err(|err| SinkError::WriteStdout { source: err })?;
            stdout
                .write_all(b"\n")
                .await
                .map_err(|err| SinkError::WriteStdout { source: err })?;
            stdout
                .flush()
                .await
                .map_err(|err| SinkError::WriteStdout { source: err })?;
            Ok(())
        }
    }
}
