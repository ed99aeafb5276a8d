use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::LoadError;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        LoadError::Parse(format!("at JSON path {path} → {}", err.into_inner()))
    })
}

/// Read a JSON file and deserialize it, reporting the file and JSON path on failure.
pub fn read_with_path<T: DeserializeOwned>(file: &Path) -> Result<T, LoadError> {
    let src = std::fs::read_to_string(file)?;
    from_str_with_path(&src).map_err(|err| match err {
        LoadError::Parse(msg) => LoadError::Parse(format!("({}) {msg}", file.display())),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FormDoc;

    #[test]
    fn reports_json_path() {
        let src = r#"{"fields": [{"name": "a", "kind": "text"}, {"name": "b", "kind": "blob"}]}"#;
        let err = from_str_with_path::<FormDoc>(src).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("fields[1].kind"), "{msg}");
    }

    #[test]
    fn reports_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        std::fs::write(&file, r#"{"fields": 3}"#).unwrap();
        let msg = read_with_path::<FormDoc>(&file).unwrap_err().to_string();
        assert!(msg.contains("broken.json"), "{msg}");
        assert!(msg.contains("fields"), "{msg}");
    }
}
