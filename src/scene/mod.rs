pub mod assets;
pub mod layers;

use crate::foundation::core::SurfaceSize;
use crate::scene::assets::ImageAsset;
use crate::scene::layers::{BackgroundLayer, CardLayer};

/// Everything the compositor reads: the two decoded assets and their layer
/// states.
///
/// The session owns the scene; the gesture controller is the only mutator
/// while a gesture is active. A layer stays `None` until a valid asset and a
/// non-degenerate surface produce a placement, and the compositor simply
/// skips missing layers.
#[derive(Clone, Default)]
pub struct Scene {
    pub(crate) background_asset: Option<ImageAsset>,
    pub(crate) card_asset: Option<ImageAsset>,
    pub background: Option<BackgroundLayer>,
    pub card: Option<CardLayer>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new background asset, replacing any previous one, and derive
    /// its cover-fit placement for `surface`.
    pub fn set_background(&mut self, asset: ImageAsset, surface: SurfaceSize) {
        self.background = BackgroundLayer::fit(asset.size(), surface);
        self.background_asset = Some(asset);
    }

    /// Install a new card asset, replacing any previous one, and derive its
    /// initial placement for `surface`.
    pub fn set_card(&mut self, asset: ImageAsset, surface: SurfaceSize) {
        self.card = CardLayer::place(asset.size(), surface);
        self.card_asset = Some(asset);
    }

    /// Recompute both placements from the stored assets, e.g. after the
    /// surface resolution changed.
    pub fn reinit(&mut self, surface: SurfaceSize) {
        self.background = self
            .background_asset
            .as_ref()
            .and_then(|a| BackgroundLayer::fit(a.size(), surface));
        self.card = self
            .card_asset
            .as_ref()
            .and_then(|a| CardLayer::place(a.size(), surface));
    }

    pub fn background_asset(&self) -> Option<&ImageAsset> {
        self.background_asset.as_ref()
    }

    pub fn card_asset(&self) -> Option<&ImageAsset> {
        self.card_asset.as_ref()
    }

    /// Both layers placed and ready to composite.
    pub fn is_composed(&self) -> bool {
        self.background.is_some() && self.card.is_some()
    }
}
