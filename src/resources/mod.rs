//! Asset loading.
//!
//! Textures are fetched fire-and-forget: [`Spawner::fetch_texture`] starts a
//! background task that reads and decodes the file and hands the decoded
//! image to a callback. Failures are logged and dropped; the material simply
//! keeps its default texture.

pub mod texture;

use std::future::Future;

use anyhow::Context as _;

use crate::data_structures::material::TextureRef;

/// A decoded texture image waiting for GPU upload on the render thread.
#[derive(Debug)]
pub struct LoadedTexture {
    pub texture: TextureRef,
    pub image: image::DynamicImage,
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin unavailable"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = crate::config::asset_root().join(file_name);
        std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_image(texture: &TextureRef) -> anyhow::Result<image::DynamicImage> {
    let bytes = load_binary(&texture.path).await?;
    image::load_from_memory(&bytes).with_context(|| format!("decoding {}", texture.path))
}

/// Runs detached background tasks on whatever executor the platform offers.
#[derive(Clone, Debug)]
pub struct Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    handle: tokio::runtime::Handle,
}

impl Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }

    #[cfg(target_arch = "wasm32")]
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + 'static,
    {
        wasm_bindgen_futures::spawn_local(fut);
    }

    /// Load `texture` in the background and pass it to `deliver` once decoded.
    pub fn fetch_texture<D>(&self, texture: TextureRef, deliver: D)
    where
        D: FnOnce(LoadedTexture) + Send + 'static,
    {
        self.spawn(async move {
            match load_image(&texture).await {
                Ok(image) => {
                    log::info!("texture {} loaded", texture.path);
                    deliver(LoadedTexture { texture, image });
                }
                Err(e) => log::warn!("texture {} left unset: {:#}", texture.path, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_asset_is_an_error() {
        let result = futures::executor::block_on(load_binary("no-such-texture.png"));
        let err = result.expect_err("the file does not exist");
        assert!(format!("{err:#}").contains("no-such-texture.png"));
    }

    #[test]
    fn undecodable_bytes_are_reported_per_texture() {
        let dir = std::env::temp_dir().join("portfolio-scene-resources-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("garbage.png");
        std::fs::write(&file, b"not an image").unwrap();

        let texture = TextureRef::color(file.to_string_lossy().into_owned());
        let err = futures::executor::block_on(load_image(&texture)).expect_err("garbage");
        assert!(format!("{err:#}").contains("decoding"));
    }

    #[test]
    fn failed_fetch_never_delivers() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let spawner = Spawner::new(runtime.handle().clone());
        let (tx, rx) = std::sync::mpsc::channel::<String>();
        spawner.fetch_texture(TextureRef::color("no-such-texture.jpg"), move |loaded| {
            let _ = tx.send(loaded.texture.path);
        });
        // the sender is dropped with the task once the load fails
        assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).is_err());
    }
}
