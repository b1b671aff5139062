//! TOML codec for model configurations.

use std::io::{BufRead, Write};

use super::StreamArtifact;
use crate::config::MsmConfig;
use crate::error::MsmError;

impl StreamArtifact for MsmConfig {
    const NAME: &'static str = "config";

    fn write_to<W: Write>(&self, mut writer: W) -> Result<(), MsmError> {
        let text = toml::to_string(self).map_err(|e| MsmError::Parse {
            artifact: Self::NAME,
            reason: e.to_string(),
        })?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn read_from<R: BufRead>(mut reader: R) -> Result<Self, MsmError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let config: MsmConfig = toml::from_str(&text).map_err(|e| MsmError::Parse {
            artifact: Self::NAME,
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::Method;

    #[test]
    fn written_form() {
        let config = MsmConfig::new(3).with_trim(true).with_method(Method::Transpose);
        let mut buf = Vec::new();
        config.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("lag_time = 3"));
        assert!(text.contains("method = \"transpose\""));
        assert_eq!(MsmConfig::read_from(text.as_bytes()).unwrap(), config);
    }

    #[test]
    fn rejects_invalid_lag() {
        let result = MsmConfig::read_from("lag_time = 0".as_bytes());
        assert!(matches!(result, Err(MsmError::InvalidLagTime { .. })));
    }

    #[test]
    fn rejects_unknown_method() {
        let result = MsmConfig::read_from("lag_time = 1\nmethod = \"bayes\"".as_bytes());
        assert!(matches!(result, Err(MsmError::Parse { artifact: "config", .. })));
    }
}
