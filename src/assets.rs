//! Asset loading
//!
//! Three named images are required before the scene can start:
//! - `player`: sprite sheet of square frames
//! - `projectile`: single image
//! - `tile`: background tile, repeated over the viewport
//!
//! Bytes come from the filesystem (native) or HTTP fetch (web), then are
//! decoded to RGBA8. Any failure is fatal and names the asset.

use std::path::{Path, PathBuf};

use glam::Vec2;
use image::RgbaImage;
use thiserror::Error;

use crate::sim::anim::ClipError;

/// Named assets the game needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Player,
    Projectile,
    Tile,
}

impl AssetKey {
    pub fn name(&self) -> &'static str {
        match self {
            AssetKey::Player => "player",
            AssetKey::Projectile => "projectile",
            AssetKey::Tile => "tile",
        }
    }

    /// Path relative to the asset root
    pub fn path(&self) -> &'static str {
        match self {
            AssetKey::Player => "assets/player.png",
            AssetKey::Projectile => "assets/fireball.png",
            AssetKey::Tile => "assets/tile.png",
        }
    }

    fn index(&self) -> usize {
        match self {
            AssetKey::Player => 0,
            AssetKey::Projectile => 1,
            AssetKey::Tile => 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("missing asset `{name}` at {path}")]
    Missing {
        name: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch asset `{name}` from {path}: {reason}")]
    Fetch {
        name: &'static str,
        path: String,
        reason: String,
    },
    #[error("failed to decode asset `{name}`")]
    Decode {
        name: &'static str,
        #[source]
        source: image::ImageError,
    },
    #[error("sprite sheet `{name}` is {width}x{height}, which is not a grid of {frame}x{frame} frames")]
    BadSheet {
        name: &'static str,
        width: u32,
        height: u32,
        frame: u32,
    },
    #[error(transparent)]
    Clip(#[from] ClipError),
}

/// Texture sampling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Linear,
    /// Keeps pixel art sharp when scaled up
    Nearest,
}

/// A decoded image plus how it should be sampled
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub key: AssetKey,
    pub image: RgbaImage,
    pub filter: TextureFilter,
}

impl TextureAsset {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }
}

/// Frame layout of a sprite sheet (row-major frame numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetGrid {
    pub frame_width: u32,
    pub frame_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl SheetGrid {
    /// Returns None unless the image is a whole, non-empty grid of frames
    pub fn new(image_width: u32, image_height: u32, frame_width: u32, frame_height: u32) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 {
            return None;
        }
        if image_width == 0 || image_height == 0 {
            return None;
        }
        if image_width % frame_width != 0 || image_height % frame_height != 0 {
            return None;
        }
        Some(Self {
            frame_width,
            frame_height,
            columns: image_width / frame_width,
            rows: image_height / frame_height,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.columns * self.rows
    }

    pub fn frame_size(&self) -> Vec2 {
        Vec2::new(self.frame_width as f32, self.frame_height as f32)
    }

    /// UV rectangle (min, max) of `frame`; out-of-range frames wrap
    pub fn frame_uv(&self, frame: u32) -> (Vec2, Vec2) {
        let frame = frame % self.frame_count().max(1);
        let col = frame % self.columns;
        let row = frame / self.columns;
        let step = Vec2::new(1.0 / self.columns as f32, 1.0 / self.rows as f32);
        let min = Vec2::new(col as f32, row as f32) * step;
        (min, min + step)
    }
}

/// Everything the loader produced, indexed by key
#[derive(Debug, Clone)]
pub struct LoadedAssets {
    textures: [TextureAsset; 3],
    player_grid: SheetGrid,
}

impl LoadedAssets {
    /// Assemble from decoded images, validating the player sheet
    pub fn from_images(
        player: RgbaImage,
        projectile: RgbaImage,
        tile: RgbaImage,
        frame_size: u32,
    ) -> Result<Self, AssetError> {
        let player_grid = SheetGrid::new(player.width(), player.height(), frame_size, frame_size)
            .ok_or(AssetError::BadSheet {
                name: AssetKey::Player.name(),
                width: player.width(),
                height: player.height(),
                frame: frame_size,
            })?;

        let texture = |key, image| TextureAsset {
            key,
            image,
            filter: TextureFilter::Linear,
        };

        Ok(Self {
            textures: [
                texture(AssetKey::Player, player),
                texture(AssetKey::Projectile, projectile),
                texture(AssetKey::Tile, tile),
            ],
            player_grid,
        })
    }

    pub fn get(&self, key: AssetKey) -> &TextureAsset {
        &self.textures[key.index()]
    }

    pub fn set_filter(&mut self, key: AssetKey, filter: TextureFilter) {
        self.textures[key.index()].filter = filter;
    }

    pub fn player_grid(&self) -> SheetGrid {
        self.player_grid
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextureAsset> {
        self.textures.iter()
    }
}

/// Decode PNG (or any format `image` was built with) bytes to RGBA8
pub fn decode(key: AssetKey, bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    let image = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
        name: key.name(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Filesystem loader rooted at a directory
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: AssetKey) -> PathBuf {
        self.root.join(key.path())
    }

    pub fn load_bytes(&self, key: AssetKey) -> Result<Vec<u8>, AssetError> {
        let path = self.path_for(key);
        std::fs::read(&path).map_err(|source| AssetError::Missing {
            name: key.name(),
            path: path.display().to_string(),
            source,
        })
    }

    /// Load and decode one asset
    pub fn load_image(&self, key: AssetKey) -> Result<RgbaImage, AssetError> {
        let bytes = self.load_bytes(key)?;
        let image = decode(key, &bytes)?;
        log::info!(
            "Loaded asset `{}` ({}x{})",
            key.name(),
            image.width(),
            image.height()
        );
        Ok(image)
    }

    /// Load and decode every asset; stops at the first failure
    pub fn load_all(&self, frame_size: u32) -> Result<LoadedAssets, AssetError> {
        let player = self.load_image(AssetKey::Player)?;
        let projectile = self.load_image(AssetKey::Projectile)?;
        let tile = self.load_image(AssetKey::Tile)?;
        LoadedAssets::from_images(player, projectile, tile, frame_size)
    }
}

/// Fetch and decode every asset over HTTP, relative to `base_url`
#[cfg(target_arch = "wasm32")]
pub async fn fetch_all(base_url: &str, frame_size: u32) -> Result<LoadedAssets, AssetError> {
    let base = base_url.trim_end_matches('/');
    let player = fetch_image(base, AssetKey::Player).await?;
    let projectile = fetch_image(base, AssetKey::Projectile).await?;
    let tile = fetch_image(base, AssetKey::Tile).await?;
    LoadedAssets::from_images(player, projectile, tile, frame_size)
}

#[cfg(target_arch = "wasm32")]
async fn fetch_image(base: &str, key: AssetKey) -> Result<RgbaImage, AssetError> {
    let url = format!("{}/{}", base, key.path());
    let bytes = fetch_bytes(&url).await.map_err(|reason| AssetError::Fetch {
        name: key.name(),
        path: url.clone(),
        reason,
    })?;
    let image = decode(key, &bytes)?;
    log::info!(
        "Fetched asset `{}` ({}x{})",
        key.name(),
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("{:?}", e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| "fetch did not return a Response".to_string())?;
    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }

    let buffer = response.array_buffer().map_err(|e| format!("{:?}", e))?;
    let buffer = JsFuture::from(buffer).await.map_err(|e| format!("{:?}", e))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
