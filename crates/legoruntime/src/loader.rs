use legocore::{FlowDefinition, FlowError};
use std::path::Path;

/// Read a flow definition from a JSON file.
pub fn load_flow(path: impl AsRef<Path>) -> Result<FlowDefinition, FlowError> {
    let file = std::fs::File::open(path.as_ref())?;
    let flow: FlowDefinition = serde_json::from_reader(std::io::BufReader::new(file))?;
    tracing::debug!(
        "Loaded flow {} from {}",
        flow.id,
        path.as_ref().display()
    );
    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_flow("/nonexistent/flow.json").unwrap_err();
        assert!(matches!(err, FlowError::Io(_)));
    }
}
