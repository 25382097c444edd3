use crate::core::compile::RouteForm;
use anyhow::{Context, Result};
use std::path::Path;

/// Reads a route form from a JSON file, or from YAML for any other extension.
pub(crate) fn read(path: &Path) -> Result<RouteForm> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let form = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&contents).context("invalid JSON route form")?
    } else {
        serde_yaml::from_str(&contents).context("invalid YAML route form")?
    };
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{compile::DestinationForm, PathMatchKind, ResourceRef};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("tempfile must be created");
        file.write_all(contents.as_bytes())
            .expect("tempfile must be written");
        file
    }

    #[test]
    fn reads_json_form() {
        let file = write(
            ".json",
            r#"{
                "path": "/api",
                "matchType": "PREFIX",
                "destination": {
                    "type": "delegate",
                    "routeTable": { "name": "rt-a", "namespace": "apps" }
                }
            }"#,
        );
        let form = read(file.path()).expect("form must parse");
        assert_eq!(form.path, "/api");
        assert_eq!(
            form.destination,
            DestinationForm::Delegate {
                route_table: Some(ResourceRef::new("apps", "rt-a")),
            }
        );
    }

    #[test]
    fn reads_yaml_form() {
        let file = write(
            ".yaml",
            "path: /users\nmatchType: REGEX\nmethods: [GET]\n",
        );
        let form = read(file.path()).expect("form must parse");
        assert_eq!(form.match_type, PathMatchKind::Regex);
        assert_eq!(form.methods, vec!["GET".to_string()]);
        assert_eq!(form.destination, DestinationForm::default());
    }

    #[test]
    fn reports_unreadable_file() {
        let error = read(Path::new("/nonexistent/route.yaml")).expect_err("file does not exist");
        assert!(error.to_string().contains("failed to read"));
    }
}
