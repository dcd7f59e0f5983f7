//! Application descriptors.
//!
//! A descriptor is the static description of an application: metadata,
//! window geometry constraints, initial window flags, control buttons and the
//! presentation bundle. Descriptors are pure data; they are validated before
//! an application is admitted to the catalog and deep-copied into every
//! process spawned from it.
//!
//! # JSON shape
//!
//! ```text
//! {
//!   "id": "notes",
//!   "metadata": { "name": "Notes", "version": "1.0", "author": "vesta" },
//!   "size": { "w": 640, "h": 480 },
//!   "minSize": { "w": 200, "h": 120 },
//!   "maxSize": { "w": 1920, "h": 1080 },
//!   "position": { "centered": true },
//!   "state": { "resizable": true, "minimized": false, "maximized": false, "fullscreen": false },
//!   "controls": { "minimize": true, "maximize": true, "close": true },
//!   "files": { "markup": "...", "style": "...", "script": "..." },
//!   "core": false, "autoRun": false, "hidden": false
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DescriptorError;

/// Dotted paths that must be present in a raw descriptor.
pub const REQUIRED_PATHS: &[&str] = &[
    "id",
    "metadata.name",
    "metadata.version",
    "metadata.author",
    "size.w",
    "size.h",
    "minSize.w",
    "minSize.h",
    "maxSize.w",
    "maxSize.h",
    "position",
    "state.resizable",
    "state.minimized",
    "state.maximized",
    "state.fullscreen",
    "controls.minimize",
    "controls.maximize",
    "controls.close",
    "files.markup",
    "files.style",
    "files.script",
];

/// Descriptive metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Display name
    pub name: String,
    /// Version string
    pub version: String,
    /// Author
    pub author: String,
    /// Optional icon resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Size {
    /// Create a size.
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    fn is_valid(&self) -> bool {
        self.w.is_finite() && self.h.is_finite() && self.w >= 0.0 && self.h >= 0.0
    }
}

/// Initial window position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Left edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Top edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Center in the viewport (a given `x`/`y` overrides that axis)
    #[serde(default)]
    pub centered: bool,
}

/// How a window is placed, resolved from a [`Position`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// Centered in the viewport, with optional per-axis overrides
    Centered {
        /// Fixed left edge instead of centering horizontally
        x: Option<f64>,
        /// Fixed top edge instead of centering vertically
        y: Option<f64>,
    },
    /// Both coordinates given
    Fixed {
        /// Left edge
        x: f64,
        /// Top edge
        y: f64,
    },
}

impl Position {
    /// Centered position.
    pub const fn centered() -> Self {
        Self {
            x: None,
            y: None,
            centered: true,
        }
    }

    /// Fixed position.
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            centered: false,
        }
    }

    /// Resolve the placement rule.
    ///
    /// A position that is neither centered nor carries both coordinates is
    /// rejected.
    pub fn placement(&self) -> Result<Placement, DescriptorError> {
        if self.centered {
            return Ok(Placement::Centered {
                x: self.x,
                y: self.y,
            });
        }
        match (self.x, self.y) {
            (Some(x), Some(y)) => Ok(Placement::Fixed { x, y }),
            _ => Err(DescriptorError::InvalidPosition),
        }
    }
}

/// Initial window flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFlags {
    /// Window can be resized
    pub resizable: bool,
    /// Starts minimized
    pub minimized: bool,
    /// Starts maximized
    pub maximized: bool,
    /// Covers the whole viewport
    pub fullscreen: bool,
}

/// Titlebar buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowControls {
    /// Minimize button
    pub minimize: bool,
    /// Maximize button
    pub maximize: bool,
    /// Close button
    pub close: bool,
}

impl Default for WindowControls {
    fn default() -> Self {
        Self {
            minimize: true,
            maximize: true,
            close: true,
        }
    }
}

/// Presentation bundle references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFiles {
    /// Markup resource
    pub markup: String,
    /// Stylesheet resource
    pub style: String,
    /// Behavior script reference
    pub script: String,
}

/// Static description of an application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDescriptor {
    /// Unique application id
    pub id: String,
    /// Descriptive metadata
    pub metadata: AppMetadata,
    /// Initial size
    pub size: Size,
    /// Minimum size
    pub min_size: Size,
    /// Maximum size
    pub max_size: Size,
    /// Initial position
    pub position: Position,
    /// Initial window flags
    pub state: WindowFlags,
    /// Titlebar buttons
    pub controls: WindowControls,
    /// Presentation bundle
    pub files: AppFiles,
    /// Hidden from launchers
    #[serde(default)]
    pub hidden: bool,
    /// Part of the desktop shell: fullscreen, no geometry
    #[serde(default)]
    pub core: bool,
    /// Spawned when the desktop loads
    #[serde(default)]
    pub auto_run: bool,
}

impl AppDescriptor {
    /// A centered, resizable 640x480 window with a bundle under `apps/<id>/`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            files: AppFiles {
                markup: format!("apps/{}/index.html", id),
                style: format!("apps/{}/style.css", id),
                script: format!("apps/{}/main", id),
            },
            metadata: AppMetadata {
                name: name.into(),
                version: String::from("1.0.0"),
                author: String::from("vesta"),
                icon: None,
            },
            size: Size::new(640.0, 480.0),
            min_size: Size::new(200.0, 120.0),
            max_size: Size::new(3840.0, 2160.0),
            position: Position::centered(),
            state: WindowFlags {
                resizable: true,
                ..WindowFlags::default()
            },
            controls: WindowControls::default(),
            hidden: false,
            core: false,
            auto_run: false,
            id,
        }
    }

    /// Replace the position.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Replace the initial size.
    pub fn with_size(mut self, w: f64, h: f64) -> Self {
        self.size = Size::new(w, h);
        self
    }

    /// Mark as a core (shell) application.
    pub fn core(mut self) -> Self {
        self.core = true;
        self
    }

    /// Spawn when the desktop loads.
    pub fn auto_run(mut self) -> Self {
        self.auto_run = true;
        self
    }

    /// Check a raw JSON descriptor for every required path.
    pub fn validate_json(raw: &Value) -> Result<(), DescriptorError> {
        for path in REQUIRED_PATHS {
            let present = path
                .split('.')
                .try_fold(raw, |node, key| node.get(key))
                .is_some_and(|v| !v.is_null());
            if !present {
                return Err(DescriptorError::MissingField(path.to_string()));
            }
        }
        Ok(())
    }

    /// Validate the required paths, then deserialize and validate.
    pub fn from_json(raw: Value) -> Result<Self, DescriptorError> {
        Self::validate_json(&raw)?;
        let descriptor: Self =
            serde_json::from_value(raw).map_err(|e| DescriptorError::Malformed(e.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Validate a typed descriptor.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let strings = [
            ("id", &self.id),
            ("metadata.name", &self.metadata.name),
            ("metadata.version", &self.metadata.version),
            ("metadata.author", &self.metadata.author),
            ("files.markup", &self.files.markup),
            ("files.style", &self.files.style),
            ("files.script", &self.files.script),
        ];
        for (field, value) in strings {
            if value.trim().is_empty() {
                return Err(DescriptorError::EmptyField(field.to_string()));
            }
        }

        if self.core {
            return Ok(());
        }

        for (field, size) in [
            ("size", self.size),
            ("minSize", self.min_size),
            ("maxSize", self.max_size),
        ] {
            if !size.is_valid() {
                return Err(DescriptorError::InvalidSize(field.to_string()));
            }
        }
        self.position.placement()?;
        Ok(())
    }
}
