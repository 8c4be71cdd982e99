//! Generation target descriptors
//!
//! A workspace targets exactly one output ecosystem. The descriptor carries
//! the vetted output location and the naming options the renderer needs, and
//! is immutable once created: the output path goes through the resolver here,
//! at construction time, and is never re-validated later.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::{resolve_output_path, PathError};

/// The output ecosystem a workspace generates code for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "android")]
    Android,
    #[serde(rename = "web")]
    Web,
}

impl Source {
    /// The value used in the persisted `source` field and in messages.
    pub fn key(&self) -> &'static str {
        match self {
            Source::Ios => "iOS",
            Source::Android => "android",
            Source::Web => "web",
        }
    }

    /// File name used when the user does not supply an output path.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Source::Ios => "TrackingEvents.swift",
            Source::Android => "TrackingEvents.kt",
            Source::Web => "trackingEvents.ts",
        }
    }
}

/// Naming options shared by all targets, plus the per-target extras,
/// collected before descriptor construction.
#[derive(Debug, Clone)]
pub struct PluginOptions {
    /// Relative output path; absent means the target default.
    pub output: Option<String>,
    /// Name of the generated top-level type.
    pub type_name: Option<String>,
    /// Package name (Android only).
    pub package_name: Option<String>,
    /// Namespace (web only).
    pub namespace: Option<String>,
    /// Emit doc comments on generated declarations.
    pub include_documentation: bool,
    /// Wrap generated declarations in a wrapper type.
    pub emit_wrapper: bool,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            output: None,
            type_name: None,
            package_name: None,
            namespace: None,
            include_documentation: true,
            emit_wrapper: false,
        }
    }
}

const DEFAULT_TYPE_NAME: &str = "TrackingEvents";
const DEFAULT_PACKAGE_NAME: &str = "com.tracksmith.events";

/// iOS target options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosPlugin {
    pub output_file_path: PathBuf,
    pub type_name: String,
    pub include_documentation: bool,
    pub emit_wrapper: bool,
}

/// Android target options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidPlugin {
    pub output_file_path: PathBuf,
    pub package_name: String,
    pub type_name: String,
    pub include_documentation: bool,
    pub emit_wrapper: bool,
}

/// Web target options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPlugin {
    pub output_file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub type_name: String,
    pub include_documentation: bool,
    pub emit_wrapper: bool,
}

/// One descriptor per target, persisted as a single-key map
/// (`ios:` / `android:` / `web:`). Deserialization rejects zero keys,
/// multiple keys, and unrecognized keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPlugin {
    Ios(IosPlugin),
    Android(AndroidPlugin),
    Web(WebPlugin),
}

/// Mirror of [`TargetPlugin`] carrying the derived serde impls; the manual
/// impls below route them through `singleton_map` so the YAML encoding is the
/// single-key map form rather than a `!tag`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase", remote = "TargetPlugin")]
enum TargetPluginDef {
    Ios(IosPlugin),
    Android(AndroidPlugin),
    Web(WebPlugin),
}

impl Serialize for TargetPlugin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        struct Proxy<'a>(&'a TargetPlugin);
        impl Serialize for Proxy<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                TargetPluginDef::serialize(self.0, serializer)
            }
        }
        serde_yaml_ng::with::singleton_map::serialize(&Proxy(self), serializer)
    }
}

impl<'de> Deserialize<'de> for TargetPlugin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Proxy(TargetPlugin);
        impl<'de> Deserialize<'de> for Proxy {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                TargetPluginDef::deserialize(deserializer).map(Proxy)
            }
        }
        serde_yaml_ng::with::singleton_map::deserialize(deserializer)
            .map(|Proxy(plugin)| plugin)
    }
}

impl TargetPlugin {
    /// Build a descriptor for `source`, routing the output path through the
    /// resolver against `working_dir`.
    pub fn new(
        source: Source,
        options: PluginOptions,
        working_dir: &Path,
    ) -> Result<Self, PathError> {
        let output_file_path = resolve_output_path(
            options.output.as_deref(),
            source.default_file_name(),
            working_dir,
            source,
        )?;
        let type_name = options
            .type_name
            .unwrap_or_else(|| DEFAULT_TYPE_NAME.to_string());

        Ok(match source {
            Source::Ios => TargetPlugin::Ios(IosPlugin {
                output_file_path,
                type_name,
                include_documentation: options.include_documentation,
                emit_wrapper: options.emit_wrapper,
            }),
            Source::Android => TargetPlugin::Android(AndroidPlugin {
                output_file_path,
                package_name: options
                    .package_name
                    .unwrap_or_else(|| DEFAULT_PACKAGE_NAME.to_string()),
                type_name,
                include_documentation: options.include_documentation,
                emit_wrapper: options.emit_wrapper,
            }),
            Source::Web => TargetPlugin::Web(WebPlugin {
                output_file_path,
                namespace: options.namespace,
                type_name,
                include_documentation: options.include_documentation,
                emit_wrapper: options.emit_wrapper,
            }),
        })
    }

    /// Which source this descriptor belongs to.
    pub fn source(&self) -> Source {
        match self {
            TargetPlugin::Ios(_) => Source::Ios,
            TargetPlugin::Android(_) => Source::Android,
            TargetPlugin::Web(_) => Source::Web,
        }
    }

    /// The vetted output location.
    pub fn output_file_path(&self) -> &Path {
        match self {
            TargetPlugin::Ios(plugin) => &plugin.output_file_path,
            TargetPlugin::Android(plugin) => &plugin.output_file_path,
            TargetPlugin::Web(plugin) => &plugin.output_file_path,
        }
    }
}
