//! Value types referenced by aircraft definitions.

use std::fmt;

/// Operator placeholder meaning "no operator" in `MATCHES` lines.
pub const NO_OPERATOR: &str = "-";

/// Separators accepted between package name and relative path in `OBJ8` lines.
const PACKAGE_SEPARATORS: [char; 3] = ['/', '\\', ':'];

/// Reference to an object model file in a (possibly different) package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectModelRef {
    /// Exported name of the package holding the model.
    pub package: String,

    /// Path of the model file within that package, `/`-separated.
    pub path: String,

    /// Replacement for the model's `TEXTURE` file.
    pub texture: Option<String>,

    /// Replacement for the model's `TEXTURE_LIT` file.
    pub lit_texture: Option<String>,
}

impl ObjectModelRef {
    /// Create a reference without texture overrides.
    pub fn new(package: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            path: path.into(),
            texture: None,
            lit_texture: None,
        }
    }

    /// Set the texture overrides.
    pub fn with_textures(mut self, texture: Option<String>, lit_texture: Option<String>) -> Self {
        self.texture = texture;
        self.lit_texture = lit_texture;
        self
    }

    /// Parse the value tokens of an `OBJ8` line.
    ///
    /// Expects 3 to 5 values: mode, solid flag, `package/path`, then optional
    /// texture and lit-texture. The package name ends at the first `/`, `\` or
    /// `:`; the remainder is normalized to `/` separators.
    ///
    /// # Example
    ///
    /// ```
    /// use csl_ondemand::package::ObjectModelRef;
    ///
    /// let obj = ObjectModelRef::from_obj8_values(&["SOLID", "YES", "B738:models\\b738.obj", "b738_dlh.dds"]).unwrap();
    /// assert_eq!(obj.package, "B738");
    /// assert_eq!(obj.path, "models/b738.obj");
    /// assert_eq!(obj.texture.as_deref(), Some("b738_dlh.dds"));
    /// assert!(obj.lit_texture.is_none());
    /// ```
    pub fn from_obj8_values(values: &[&str]) -> Option<Self> {
        if !(3..=5).contains(&values.len()) {
            return None;
        }
        let reference = values[2];
        let split = reference.find(PACKAGE_SEPARATORS).filter(|&i| i > 0)?;
        let package = &reference[..split];
        let path: String = reference[split + 1..]
            .chars()
            .map(|c| if PACKAGE_SEPARATORS.contains(&c) { '/' } else { c })
            .collect();

        Some(Self::new(package, path).with_textures(
            values.get(3).map(|s| s.to_string()),
            values.get(4).map(|s| s.to_string()),
        ))
    }
}

impl fmt::Display for ObjectModelRef {
    /// Renders the `OBJ8` value tail: `package/path[ texture][ lit]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.path)?;
        if let Some(texture) = self.texture.as_deref().filter(|t| !t.is_empty()) {
            write!(f, " {}", texture)?;
        }
        if let Some(lit) = self.lit_texture.as_deref().filter(|t| !t.is_empty()) {
            write!(f, " {}", lit)?;
        }
        Ok(())
    }
}

/// An ICAO/operator/livery combination an aircraft definition claims to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchSelector {
    /// ICAO type designator.
    pub icao: String,

    /// ICAO operator (airline) code.
    pub operator: Option<String>,

    /// Livery code.
    pub livery: Option<String>,
}

impl MatchSelector {
    /// Create a selector.
    pub fn new(icao: impl Into<String>, operator: Option<&str>, livery: Option<&str>) -> Self {
        Self {
            icao: icao.into(),
            operator: operator.map(str::to_string),
            livery: livery.map(str::to_string),
        }
    }

    /// Parse the value tokens of a `MATCHES`/`ICAO`/`AIRLINE`/`LIVERY` line.
    ///
    /// Expects 1 to 3 values; a literal `-` operator means "no operator".
    pub fn from_values(values: &[&str]) -> Option<Self> {
        match values {
            [icao] => Some(Self::new(*icao, None, None)),
            [icao, operator] => Some(Self::new(*icao, non_placeholder(operator), None)),
            [icao, operator, livery] => {
                Some(Self::new(*icao, non_placeholder(operator), Some(*livery)))
            }
            _ => None,
        }
    }
}

fn non_placeholder<'a>(operator: &&'a str) -> Option<&'a str> {
    (*operator != NO_OPERATOR).then_some(*operator)
}

impl fmt::Display for MatchSelector {
    /// Renders the `MATCHES` value tail: `icao[ operator][ livery]`, with `-`
    /// standing in for a missing operator before a livery.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.icao)?;
        let operator = self.operator.as_deref().filter(|o| !o.is_empty());
        if let Some(operator) = operator {
            write!(f, " {}", operator)?;
        }
        if let Some(livery) = self.livery.as_deref().filter(|l| !l.is_empty()) {
            match operator {
                Some(_) => write!(f, " {}", livery)?,
                None => write!(f, " {} {}", NO_OPERATOR, livery)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obj8_value_count() {
        assert!(ObjectModelRef::from_obj8_values(&["SOLID", "YES"]).is_none());
        assert!(ObjectModelRef::from_obj8_values(&["SOLID", "YES", "a/b", "t", "l", "x"]).is_none());
        assert!(ObjectModelRef::from_obj8_values(&["SOLID", "YES", "a/b.obj"]).is_some());
    }

    #[test]
    fn test_obj8_requires_package_prefix() {
        assert!(ObjectModelRef::from_obj8_values(&["SOLID", "YES", "plain.obj"]).is_none());
        assert!(ObjectModelRef::from_obj8_values(&["SOLID", "YES", "/abs.obj"]).is_none());
    }

    #[test]
    fn test_obj8_path_normalization() {
        let obj = ObjectModelRef::from_obj8_values(&["GLASS", "NO", "Pkg\\sub:dir/x.obj"]).unwrap();
        assert_eq!(obj.package, "Pkg");
        assert_eq!(obj.path, "sub/dir/x.obj");
    }

    #[test]
    fn test_obj8_display() {
        let obj = ObjectModelRef::new("C172", "c172.obj");
        assert_eq!(obj.to_string(), "C172/c172.obj");

        let obj = obj.with_textures(Some("red.dds".into()), Some("red_LIT.dds".into()));
        assert_eq!(obj.to_string(), "C172/c172.obj red.dds red_LIT.dds");
    }

    #[test]
    fn test_selector_values() {
        assert_eq!(
            MatchSelector::from_values(&["A320"]),
            Some(MatchSelector::new("A320", None, None))
        );
        assert_eq!(
            MatchSelector::from_values(&["A320", "-", "SKY"]),
            Some(MatchSelector::new("A320", None, Some("SKY")))
        );
        assert_eq!(
            MatchSelector::from_values(&["A320", "DLH"]),
            Some(MatchSelector::new("A320", Some("DLH"), None))
        );
        assert!(MatchSelector::from_values(&[]).is_none());
        assert!(MatchSelector::from_values(&["A320", "DLH", "X", "Y"]).is_none());
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(MatchSelector::new("C172", None, None).to_string(), "C172");
        assert_eq!(
            MatchSelector::new("C172", None, Some("0HA")).to_string(),
            "C172 - 0HA"
        );
        assert_eq!(
            MatchSelector::new("A320", Some("DLH"), Some("STAR")).to_string(),
            "A320 DLH STAR"
        );
    }
}
