//! Bundle assembly for a single aircraft.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::part::BundlePart;
use super::Bundle;
use crate::config::DEFAULT_MANIFEST_NAME;
use crate::error::{CslError, CslResult};
use crate::index::PackageIndex;
use crate::io::{cancellable, normalize_relative, LineReader};
use crate::package::{AircraftDefinition, ObjectModelRef};

const TEXTURE: &str = "TEXTURE";
const TEXTURE_LIT: &str = "TEXTURE_LIT";

/// Collects the files needed to render one aircraft.
///
/// Parts are emitted textures first, then rewritten model files, then the
/// manifest fragment. Every file appears once.
#[derive(Debug, Clone)]
pub struct BundleAssembler<'a> {
    csl_root: PathBuf,
    index: &'a PackageIndex,
    manifest_name: String,
    texture_base_url: Option<String>,
}

impl<'a> BundleAssembler<'a> {
    /// Create an assembler reading files below `csl_root`.
    pub fn new(csl_root: impl Into<PathBuf>, index: &'a PackageIndex) -> Self {
        Self {
            csl_root: csl_root.into(),
            index,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            texture_base_url: None,
        }
    }

    /// Filename of the manifest fragment within the package root.
    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Serve textures by reference below `base_url` instead of embedding them.
    pub fn with_texture_base_url(mut self, base_url: Option<&str>) -> Self {
        self.texture_base_url = base_url.map(|url| url.trim_end_matches('/').to_string());
        self
    }

    /// Assemble the bundle for `aircraft`.
    ///
    /// Fails without a partial result if any model or texture cannot be read,
    /// a referenced package is unknown, or `cancel` fires.
    pub async fn assemble(
        &self,
        aircraft: &AircraftDefinition,
        cancel: &CancellationToken,
    ) -> CslResult<Bundle> {
        let package = aircraft.pack();
        let mut seen = HashSet::new();
        let mut textures = Vec::new();
        let mut models = Vec::new();

        for definition in package.aircraft() {
            for object in &definition.objects {
                let model_path = self.model_path(object)?;
                if !seen.insert(model_path.clone()) {
                    continue;
                }

                let rewritten = self.rewrite_model(&model_path, object, cancel).await?;
                let model_dir = model_path.rsplit_once('/').map_or("", |(dir, _)| dir);
                for texture in &rewritten.textures {
                    let texture_path = join_relative(model_dir, texture)?;
                    if seen.insert(texture_path.clone()) {
                        textures.push(self.texture_part(texture_path, cancel).await?);
                    }
                }
                models.push(BundlePart::text(model_path, rewritten.body));
            }
        }

        let manifest_path = join_relative(&package.root, &self.manifest_name)?;
        let manifest = BundlePart::text(manifest_path, package.to_manifest(false));

        debug!(
            root = %aircraft.root,
            id = %aircraft.id,
            textures = textures.len(),
            models = models.len(),
            "Bundle assembled"
        );

        let mut parts = textures;
        parts.append(&mut models);
        parts.push(manifest);
        Ok(Bundle::new(aircraft.key(), parts))
    }

    /// Resolve an object reference to its file below the CSL root.
    fn model_path(&self, object: &ObjectModelRef) -> CslResult<String> {
        let owner = self
            .index
            .package(&object.package)
            .ok_or_else(|| CslError::UnknownPackage(object.package.clone()))?;
        join_relative(&owner.root, &object.path)
    }

    async fn rewrite_model(
        &self,
        model_path: &str,
        object: &ObjectModelRef,
        cancel: &CancellationToken,
    ) -> CslResult<RewrittenModel> {
        let path = self.absolute(model_path);
        let mut lines = LineReader::open(&path, cancel).await?;
        let mut rewritten = RewrittenModel::default();

        while let Some(line) = lines.next_line(cancel).await? {
            match texture_directive(line) {
                Some((directive, current)) => {
                    let replacement = match directive {
                        TEXTURE => object.texture.as_deref(),
                        _ => object.lit_texture.as_deref(),
                    };
                    match replacement.or(current) {
                        Some(texture) => {
                            rewritten.push_line(format!("{} {}", directive, texture).as_bytes());
                            rewritten.textures.push(texture.to_string());
                        }
                        None => rewritten.push_line(line),
                    }
                }
                None => rewritten.push_line(line),
            }
        }
        Ok(rewritten)
    }

    async fn texture_part(&self, texture_path: String, cancel: &CancellationToken) -> CslResult<BundlePart> {
        let path = self.absolute(&texture_path);
        let metadata = cancellable(cancel, tokio::fs::metadata(&path))
            .await?
            .map_err(|e| CslError::io(&path, e))?;
        let modified = metadata.modified().ok();

        match &self.texture_base_url {
            Some(base) => {
                let url = format!("{}/{}", base, texture_path);
                Ok(BundlePart::external(texture_path, url, metadata.len(), modified))
            }
            None => {
                let body = cancellable(cancel, tokio::fs::read(&path))
                    .await?
                    .map_err(|e| CslError::io(&path, e))?;
                Ok(BundlePart::file(texture_path, Bytes::from(body), modified))
            }
        }
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.csl_root.clone(), |path, segment| path.join(segment))
    }
}

#[derive(Debug, Default)]
struct RewrittenModel {
    body: Vec<u8>,
    textures: Vec<String>,
}

impl RewrittenModel {
    fn push_line(&mut self, line: &[u8]) {
        self.body.extend_from_slice(line);
        self.body.push(b'\n');
    }
}

/// Split a `TEXTURE`/`TEXTURE_LIT` line into its directive and current value.
fn texture_directive(line: &[u8]) -> Option<(&'static str, Option<&str>)> {
    let text = std::str::from_utf8(line).ok()?.trim_start();
    let mut tokens = text.splitn(2, char::is_whitespace);
    let directive = match tokens.next()? {
        TEXTURE => TEXTURE,
        TEXTURE_LIT => TEXTURE_LIT,
        _ => return None,
    };
    let value = tokens.next().map(str::trim).filter(|v| !v.is_empty());
    Some((directive, value))
}

/// Join a package-relative path onto a root, rejecting escapes.
fn join_relative(root: &str, path: &str) -> CslResult<String> {
    let joined = if root.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", root, path)
    };
    normalize_relative(&joined)
        .filter(|p| !p.is_empty())
        .ok_or(CslError::InvalidResourcePath(joined))
}

impl Bundle {
    /// Assemble a bundle with default settings.
    pub async fn assemble(
        csl_root: &Path,
        index: &PackageIndex,
        aircraft: &AircraftDefinition,
        cancel: &CancellationToken,
    ) -> CslResult<Self> {
        BundleAssembler::new(csl_root, index).assemble(aircraft, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::PartBody;
    use crate::package::{parse_manifest, MatchSelector, Package};
    use std::fs;
    use tempfile::TempDir;

    const MODEL: &str = "I\n800\nOBJ\n\nTEXTURE c172.dds\nTEXTURE_LIT c172_LIT.dds\nTEXTURE_NORMAL c172_n.png\nPOINT_COUNTS 0 0 0 0\n";

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, PackageIndex) {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Cessna/C172/c172.obj", MODEL.as_bytes());
        write(temp.path(), "Cessna/C172/c172.dds", b"DDS base");
        write(temp.path(), "Cessna/C172/c172_LIT.dds", b"DDS lit");
        write(temp.path(), "Cessna/C172/red.dds", b"DDS red");
        write(temp.path(), "Lights/beacon.obj", b"I\n800\nOBJ\nTEXTURE ../Cessna/C172/c172.dds\n");

        let mut cessna = Package::new("Cessna/C172").with_export("C172");
        cessna.push_aircraft(AircraftDefinition::new("Cessna/C172", "C172_0HA"));
        let lights = Package::new("Lights").with_export("LIGHTS");
        (temp, PackageIndex::from_packages(vec![cessna, lights]))
    }

    fn aircraft(objects: Vec<ObjectModelRef>) -> AircraftDefinition {
        let mut a = AircraftDefinition::new("Cessna/C172", "C172_0HA");
        a.objects.extend(objects);
        a.selectors.insert(MatchSelector::new("C172", None, Some("0HA")));
        a
    }

    fn filenames(bundle: &Bundle) -> Vec<&str> {
        bundle.parts().iter().map(|p| p.filename.as_str()).collect()
    }

    #[tokio::test]
    async fn test_assembles_textures_models_manifest() {
        let (temp, index) = fixture();
        let cancel = CancellationToken::new();
        let a = aircraft(vec![ObjectModelRef::new("C172", "c172.obj")]);

        let bundle = Bundle::assemble(temp.path(), &index, &a, &cancel).await.unwrap();

        assert_eq!(
            filenames(&bundle),
            vec![
                "Cessna/C172/c172.dds",
                "Cessna/C172/c172_LIT.dds",
                "Cessna/C172/c172.obj",
                "Cessna/C172/xsb_aircraft.txt",
            ]
        );
        assert_eq!(bundle.parts()[0].content_type, "image/vnd.ms-dds");
        assert!(bundle.parts()[0].last_modified.is_some());
        assert_eq!(bundle.parts()[2].bytes().unwrap().as_ref(), MODEL.as_bytes());

        let manifest = std::str::from_utf8(bundle.manifest().bytes().unwrap()).unwrap();
        assert!(manifest.starts_with("EXPORT_NAME C172\n"));
        assert!(manifest.contains("MATCHES C172 - 0HA\n"));
    }

    #[tokio::test]
    async fn test_texture_overrides() {
        let (temp, index) = fixture();
        let cancel = CancellationToken::new();
        let a = aircraft(vec![ObjectModelRef::new("C172", "c172.obj")
            .with_textures(Some("red.dds".into()), Some("c172_LIT.dds".into()))]);

        let bundle = Bundle::assemble(temp.path(), &index, &a, &cancel).await.unwrap();

        assert_eq!(filenames(&bundle)[0], "Cessna/C172/red.dds");
        assert!(!filenames(&bundle).contains(&"Cessna/C172/c172.dds"));
        let model = std::str::from_utf8(bundle.parts()[2].bytes().unwrap()).unwrap();
        assert!(model.contains("TEXTURE red.dds\n"));
        assert!(model.contains("TEXTURE_LIT c172_LIT.dds\n"));
        assert!(model.contains("TEXTURE_NORMAL c172_n.png\n"));
    }

    #[tokio::test]
    async fn test_shared_files_appear_once() {
        let (temp, index) = fixture();
        let cancel = CancellationToken::new();
        let a = aircraft(vec![
            ObjectModelRef::new("C172", "c172.obj"),
            ObjectModelRef::new("C172", "c172.obj").with_textures(Some("c172.dds".into()), None),
            ObjectModelRef::new("LIGHTS", "beacon.obj"),
        ]);

        let bundle = Bundle::assemble(temp.path(), &index, &a, &cancel).await.unwrap();
        let names = filenames(&bundle);
        let unique: HashSet<_> = names.iter().collect();

        assert_eq!(names.len(), unique.len());
        assert!(names.contains(&"Lights/beacon.obj"));
        assert_eq!(names.last(), Some(&"Cessna/C172/xsb_aircraft.txt"));
    }

    #[tokio::test]
    async fn test_external_textures() {
        let (temp, index) = fixture();
        let cancel = CancellationToken::new();
        let a = aircraft(vec![ObjectModelRef::new("C172", "c172.obj")]);

        let bundle = BundleAssembler::new(temp.path(), &index)
            .with_texture_base_url(Some("https://cdn.example.com/csl/"))
            .assemble(&a, &cancel)
            .await
            .unwrap();

        let texture = &bundle.parts()[0];
        assert_eq!(
            texture.body,
            PartBody::External {
                url: "https://cdn.example.com/csl/Cessna/C172/c172.dds".into(),
                length: 8,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_texture_fails() {
        let (temp, index) = fixture();
        fs::remove_file(temp.path().join("Cessna/C172/c172_LIT.dds")).unwrap();
        let cancel = CancellationToken::new();
        let a = aircraft(vec![ObjectModelRef::new("C172", "c172.obj")]);

        let err = Bundle::assemble(temp.path(), &index, &a, &cancel).await.unwrap_err();
        assert!(matches!(err, CslError::Io { .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_package_fails() {
        let (temp, index) = fixture();
        let cancel = CancellationToken::new();
        let a = aircraft(vec![ObjectModelRef::new("NOPE", "x.obj")]);

        let err = Bundle::assemble(temp.path(), &index, &a, &cancel).await.unwrap_err();
        assert!(matches!(err, CslError::UnknownPackage(name) if name == "NOPE"));
    }

    #[tokio::test]
    async fn test_cancelled_assembly() {
        let (temp, index) = fixture();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let a = aircraft(vec![ObjectModelRef::new("C172", "c172.obj")]);

        let err = Bundle::assemble(temp.path(), &index, &a, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_manifest_fragment_reparses() {
        let (temp, index) = fixture();
        let cancel = CancellationToken::new();
        let a = aircraft(vec![ObjectModelRef::new("C172", "c172.obj")]);
        let bundle = Bundle::assemble(temp.path(), &index, &a, &cancel).await.unwrap();

        let fragment = bundle.manifest().bytes().unwrap().clone();
        let package = parse_manifest(fragment.as_ref(), Path::new("fragment"), "Cessna/C172", &cancel)
            .await
            .unwrap();
        assert_eq!(package.aircraft(), &[a]);
    }

    #[test]
    fn test_texture_directive() {
        assert_eq!(texture_directive(b"TEXTURE a.dds"), Some((TEXTURE, Some("a.dds"))));
        assert_eq!(texture_directive(b"TEXTURE_LIT\t b.dds "), Some((TEXTURE_LIT, Some("b.dds"))));
        assert_eq!(texture_directive(b"TEXTURE"), Some((TEXTURE, None)));
        assert_eq!(texture_directive(b"  TEXTURE x.png"), Some((TEXTURE, Some("x.png"))));
        assert_eq!(texture_directive(b"TEXTURE_NORMAL n.png"), None);
        assert_eq!(texture_directive(b"VT 0 0 0"), None);
    }
}
