use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assets::color::{ColorDef, DEFAULT_BACKGROUND_HEX};
use crate::assets::decode::{from_data_url, to_data_url};
use crate::assets::store::{AssetId, AssetStore, Pivot};
use crate::foundation::core::Canvas;
use crate::foundation::error::{PapercutError, PapercutResult};
use crate::scene::model::{Background, Frame, Scene, SpritePlacement};
use crate::scene::project::{DEFAULT_FPS, DEFAULT_ONION_ALPHA, DEFAULT_ONION_DEPTH, Project};

/// Persisted project document.
///
/// Every field is optional on load; older documents used `onion`, `width` and `height`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDoc {
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_onion_depth", alias = "onion")]
    pub onion_depth: u32,
    #[serde(default = "default_onion_alpha")]
    pub onion_alpha: f64,
    #[serde(default = "default_canvas_width", alias = "width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height", alias = "height")]
    pub canvas_height: u32,
    #[serde(default)]
    pub background: BackgroundDoc,
    #[serde(default)]
    pub assets: BTreeMap<String, AssetDoc>,
    #[serde(default)]
    pub frames: Vec<FrameDoc>,
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

fn default_onion_depth() -> u32 {
    DEFAULT_ONION_DEPTH
}

fn default_onion_alpha() -> f64 {
    DEFAULT_ONION_ALPHA
}

fn default_canvas_width() -> u32 {
    Canvas::default().width
}

fn default_canvas_height() -> u32 {
    Canvas::default().height
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDoc {
    /// `data:<mime>;base64,...`
    #[serde(alias = "src")]
    pub image_data: String,
    #[serde(default, alias = "w")]
    pub width: u32,
    #[serde(default, alias = "h")]
    pub height: u32,
    #[serde(default)]
    pub pivot: Pivot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteDoc {
    #[serde(alias = "id")]
    pub asset_id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default, alias = "rot")]
    pub rotation: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDoc {
    #[serde(default, alias = "sprites")]
    pub sprite_placements: Vec<SpriteDoc>,
    #[serde(default, alias = "background", skip_serializing_if = "Option::is_none")]
    pub background_override: Option<BackgroundDoc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Color,
    Image,
}

/// `{kind, value}` where `value` is a color string or an image data URL.
///
/// A bare string is also accepted: data URLs become images, anything else a color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BackgroundRepr")]
pub struct BackgroundDoc {
    pub kind: BackgroundKind,
    pub value: String,
}

impl Default for BackgroundDoc {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::Color,
            value: DEFAULT_BACKGROUND_HEX.to_owned(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BackgroundRepr {
    Tagged {
        #[serde(alias = "type")]
        kind: BackgroundKind,
        #[serde(default, alias = "imageData")]
        value: String,
    },
    Bare(String),
}

impl From<BackgroundRepr> for BackgroundDoc {
    fn from(repr: BackgroundRepr) -> Self {
        match repr {
            BackgroundRepr::Tagged { kind, value } => Self { kind, value },
            BackgroundRepr::Bare(value) => {
                let kind = if value.starts_with("data:") {
                    BackgroundKind::Image
                } else {
                    BackgroundKind::Color
                };
                Self { kind, value }
            }
        }
    }
}

impl BackgroundDoc {
    fn from_background(bg: &Background) -> Self {
        match bg {
            Background::Color(c) => Self {
                kind: BackgroundKind::Color,
                value: c.to_hex(),
            },
            Background::Image(img) => Self {
                kind: BackgroundKind::Image,
                value: to_data_url(img.bytes()),
            },
        }
    }

    fn to_background(&self) -> PapercutResult<Background> {
        match self.kind {
            BackgroundKind::Color => Ok(Background::Color(parse_color_or_default(&self.value))),
            BackgroundKind::Image => Background::image(from_data_url(&self.value)?),
        }
    }
}

fn parse_color_or_default(value: &str) -> ColorDef {
    ColorDef::parse(value).unwrap_or_else(|err| {
        tracing::warn!(color = value, %err, "unparseable background color, using default");
        ColorDef::default_background()
    })
}

impl ProjectDoc {
    pub fn from_project(project: &Project) -> Self {
        let canvas = project.canvas();
        let assets = project
            .assets()
            .iter()
            .map(|a| {
                (
                    a.id().to_string(),
                    AssetDoc {
                        image_data: to_data_url(a.bytes()),
                        width: a.width(),
                        height: a.height(),
                        pivot: a.pivot(),
                    },
                )
            })
            .collect();
        let frames = project
            .scene()
            .frames()
            .iter()
            .map(|f| FrameDoc {
                sprite_placements: f
                    .sprites
                    .iter()
                    .map(|s| SpriteDoc {
                        asset_id: s.asset_id.to_string(),
                        x: s.x,
                        y: s.y,
                        scale: s.scale,
                        rotation: s.rotation,
                    })
                    .collect(),
                background_override: f.background.as_ref().map(BackgroundDoc::from_background),
            })
            .collect();

        Self {
            fps: project.fps(),
            onion_depth: project.onion_depth(),
            onion_alpha: project.onion_alpha(),
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            background: BackgroundDoc::from_background(project.background()),
            assets,
            frames,
        }
    }

    /// Rebuild a runtime project.
    ///
    /// Invalid settings or canvas sizes fail the whole load. Assets and backgrounds whose image
    /// data cannot be decoded are dropped with a warning; placements that reference a dropped
    /// asset are kept and skipped at render time.
    pub fn into_project(self) -> PapercutResult<Project> {
        let canvas = Canvas::new(self.canvas_width, self.canvas_height)?;

        let mut assets = AssetStore::new();
        for (id, doc) in self.assets {
            let bytes = match from_data_url(&doc.image_data) {
                Ok(b) => b,
                Err(err) => {
                    tracing::warn!(asset = %id, %err, "dropping asset with unreadable image data");
                    continue;
                }
            };
            let pivot = Pivot::new(doc.pivot.x, doc.pivot.y);
            match assets.insert_with_id(AssetId(id.clone()), bytes, pivot) {
                Ok(()) => {}
                Err(PapercutError::Decode(err)) => {
                    tracing::warn!(asset = %id, %err, "dropping undecodable asset");
                }
                Err(err) => return Err(err),
            }
        }

        let background = self.background.to_background().unwrap_or_else(|err| {
            tracing::warn!(%err, "project background image unreadable, using default color");
            Background::default()
        });

        let mut frames = Vec::with_capacity(self.frames.len());
        for (index, fd) in self.frames.into_iter().enumerate() {
            let mut sprites = Vec::with_capacity(fd.sprite_placements.len());
            for sd in fd.sprite_placements {
                if !(sd.x.is_finite() && sd.y.is_finite() && sd.rotation.is_finite()) {
                    return Err(PapercutError::validation(format!(
                        "frame {index}: sprite placement has non-finite coordinates"
                    )));
                }
                if !(sd.scale.is_finite() && sd.scale > 0.0) {
                    return Err(PapercutError::validation(format!(
                        "frame {index}: sprite scale must be finite and > 0"
                    )));
                }
                sprites.push(SpritePlacement {
                    asset_id: AssetId(sd.asset_id),
                    x: sd.x,
                    y: sd.y,
                    scale: sd.scale,
                    rotation: sd.rotation,
                });
            }
            let background = match fd.background_override {
                Some(bd) => match bd.to_background() {
                    Ok(bg) => Some(bg),
                    Err(err) => {
                        tracing::warn!(frame = index, %err, "dropping unreadable frame background");
                        None
                    }
                },
                None => None,
            };
            frames.push(Frame {
                sprites,
                background,
            });
        }

        let mut project = Project::from_parts(canvas, background, assets, Scene::from_frames(frames));
        project.set_fps(self.fps)?;
        project.set_onion_depth(self.onion_depth);
        project.set_onion_alpha(self.onion_alpha)?;
        Ok(project)
    }
}

impl Project {
    /// Serialize to the pretty-printed JSON document.
    pub fn to_json(&self) -> PapercutResult<String> {
        serde_json::to_string_pretty(&ProjectDoc::from_project(self))
            .map_err(|e| PapercutError::serde(format!("serialize project: {e}")))
    }

    /// Parse a JSON document and rebuild the project. The active frame is reset to 0.
    pub fn from_json(json: &str) -> PapercutResult<Self> {
        let doc: ProjectDoc = serde_json::from_str(json)
            .map_err(|e| PapercutError::serde(format!("parse project json: {e}")))?;
        doc.into_project()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/doc.rs"]
mod tests;
