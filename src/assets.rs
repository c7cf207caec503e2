//! Decoded sprite and backdrop cache.
//!
//! Decoding happens outside the cache: `ensure_loaded` queues `LoadRequest`s,
//! the browser glue drains and decodes them, and reports each result back with
//! `complete`. Every request carries the generation of the avatar data it was
//! made for, so results for replaced avatars are ignored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::AssetError;
use crate::protocol::{Avatar, Facing};

/// A decoded image with known pixel dimensions.
pub trait Bitmap {
    fn pixel_width(&self) -> f64;
    fn pixel_height(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    pub avatar: String,
    pub facing: Facing,
    pub frame: usize,
}

impl fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.avatar, self.facing.as_str(), self.frame)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetTarget {
    Sprite(SpriteKey),
    Backdrop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub target: AssetTarget,
    pub generation: u64,
    pub source: String,
}

enum Slot<B> {
    Pending,
    Ready(B),
    // permanent until the avatar's frame data changes
    Failed,
}

struct AvatarEntry<B> {
    generation: u64,
    frames: BTreeMap<Facing, Vec<String>>,
    slots: HashMap<(Facing, usize), Slot<B>>,
}

pub struct AssetCache<B> {
    avatars: HashMap<String, AvatarEntry<B>>,
    backdrop: Option<(u64, Slot<B>)>,
    next_generation: u64,
    queue: Vec<LoadRequest>,
}

impl<B: Bitmap> Default for AssetCache<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Bitmap> AssetCache<B> {
    pub fn new() -> Self {
        Self {
            avatars: HashMap::new(),
            backdrop: None,
            next_generation: 1,
            queue: Vec::new(),
        }
    }

    fn bump_generation(&mut self) -> u64 {
        let g = self.next_generation;
        self.next_generation += 1;
        g
    }

    /// Queue decoding for every frame of `avatar` that is not already resident,
    /// in flight, or failed. Changed frame data replaces the entry and
    /// re-decodes everything. Returns the number of queued requests.
    pub fn ensure_loaded(&mut self, avatar: &Avatar) -> usize {
        let unchanged = self
            .avatars
            .get(&avatar.name)
            .map_or(false, |e| e.frames == avatar.frames);
        if !unchanged {
            if self.avatars.contains_key(&avatar.name) {
                log::info!("avatar {} changed, re-decoding", avatar.name);
            }
            let generation = self.bump_generation();
            self.avatars.insert(
                avatar.name.clone(),
                AvatarEntry {
                    generation,
                    frames: avatar.frames.clone(),
                    slots: HashMap::new(),
                },
            );
        }

        let Some(entry) = self.avatars.get_mut(&avatar.name) else { return 0 };
        let mut queued = 0;
        for (facing, sources) in &entry.frames {
            for (frame, source) in sources.iter().enumerate() {
                if entry.slots.contains_key(&(*facing, frame)) {
                    continue;
                }
                entry.slots.insert((*facing, frame), Slot::Pending);
                self.queue.push(LoadRequest {
                    target: AssetTarget::Sprite(SpriteKey {
                        avatar: avatar.name.clone(),
                        facing: *facing,
                        frame,
                    }),
                    generation: entry.generation,
                    source: source.clone(),
                });
                queued += 1;
            }
        }
        queued
    }

    /// Queue the world backdrop once.
    pub fn request_backdrop(&mut self, url: &str) {
        if self.backdrop.is_some() {
            return;
        }
        let generation = self.bump_generation();
        self.backdrop = Some((generation, Slot::Pending));
        self.queue.push(LoadRequest {
            target: AssetTarget::Backdrop,
            generation,
            source: url.to_string(),
        });
    }

    pub fn drain_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.queue)
    }

    /// Record a decode result. Returns true when a new bitmap became available.
    pub fn complete(&mut self, target: &AssetTarget, generation: u64, result: Result<B, AssetError>) -> bool {
        let slot = match target {
            AssetTarget::Sprite(key) => {
                let Some(entry) = self.avatars.get_mut(&key.avatar) else {
                    log::debug!("decode for unknown avatar {} ignored", key);
                    return false;
                };
                if entry.generation != generation {
                    log::debug!("stale decode for {} ignored", key);
                    return false;
                }
                match entry.slots.get_mut(&(key.facing, key.frame)) {
                    Some(slot) => slot,
                    None => return false,
                }
            }
            AssetTarget::Backdrop => match &mut self.backdrop {
                Some((g, slot)) if *g == generation => slot,
                _ => return false,
            },
        };

        match result {
            Ok(bitmap) => {
                *slot = Slot::Ready(bitmap);
                true
            }
            Err(e) => {
                log::warn!("{}", e);
                *slot = Slot::Failed;
                false
            }
        }
    }

    pub fn get(&self, avatar: &str, facing: Facing, frame: usize) -> Option<&B> {
        match self.avatars.get(avatar)?.slots.get(&(facing, frame))? {
            Slot::Ready(b) => Some(b),
            _ => None,
        }
    }

    pub fn backdrop(&self) -> Option<&B> {
        match &self.backdrop {
            Some((_, Slot::Ready(b))) => Some(b),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_failed(&self, avatar: &str, facing: Facing, frame: usize) -> bool {
        self.avatars
            .get(avatar)
            .and_then(|e| e.slots.get(&(facing, frame)))
            .map_or(false, |s| matches!(s, Slot::Failed))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct FakeBitmap {
        pub w: f64,
        pub h: f64,
        pub tag: String,
    }

    impl FakeBitmap {
        pub(crate) fn new(w: f64, h: f64, tag: &str) -> Self {
            Self { w, h, tag: tag.to_string() }
        }
    }

    impl Bitmap for FakeBitmap {
        fn pixel_width(&self) -> f64 {
            self.w
        }

        fn pixel_height(&self) -> f64 {
            self.h
        }
    }

    fn avatar(name: &str, down: &[&str], right: &[&str]) -> Avatar {
        let mut frames = BTreeMap::new();
        frames.insert(Facing::Down, down.iter().map(|s| s.to_string()).collect());
        frames.insert(Facing::Right, right.iter().map(|s| s.to_string()).collect());
        Avatar { name: name.to_string(), frames }
    }

    fn finish_all(cache: &mut AssetCache<FakeBitmap>) {
        for req in cache.drain_requests() {
            let bmp = FakeBitmap::new(32.0, 48.0, &req.source);
            cache.complete(&req.target, req.generation, Ok(bmp));
        }
    }

    #[test]
    fn queues_every_frame_of_every_direction() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        assert_eq!(cache.ensure_loaded(&avatar("knight", &["d0", "d1"], &["r0"])), 3);
        let reqs = cache.drain_requests();
        let sources: Vec<_> = reqs.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["d0", "d1", "r0"]);
        assert!(cache.drain_requests().is_empty());
    }

    #[test]
    fn frames_become_available_independently() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        cache.ensure_loaded(&avatar("knight", &["d0", "d1"], &[]));
        let reqs = cache.drain_requests();
        assert!(cache.get("knight", Facing::Down, 0).is_none());

        assert!(cache.complete(&reqs[1].target, reqs[1].generation, Ok(FakeBitmap::new(1.0, 1.0, "d1"))));
        assert!(cache.get("knight", Facing::Down, 0).is_none());
        assert_eq!(cache.get("knight", Facing::Down, 1).unwrap().tag, "d1");
    }

    #[test]
    fn reloading_identical_avatar_does_no_work() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        let knight = avatar("knight", &["d0"], &["r0"]);
        cache.ensure_loaded(&knight);
        finish_all(&mut cache);
        assert_eq!(cache.ensure_loaded(&knight), 0);
        // in-flight frames are not queued twice either
        let mage = avatar("mage", &["m0"], &[]);
        cache.ensure_loaded(&mage);
        assert_eq!(cache.ensure_loaded(&mage), 0);
        assert_eq!(cache.drain_requests().len(), 1);
    }

    #[test]
    fn changed_avatar_redecodes_and_ignores_stale_results() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        cache.ensure_loaded(&avatar("knight", &["old"], &[]));
        let old = cache.drain_requests();

        assert_eq!(cache.ensure_loaded(&avatar("knight", &["new"], &[])), 1);
        let new = cache.drain_requests();
        assert_ne!(old[0].generation, new[0].generation);

        // late result for the replaced data is discarded
        assert!(!cache.complete(&old[0].target, old[0].generation, Ok(FakeBitmap::new(1.0, 1.0, "old"))));
        assert!(cache.get("knight", Facing::Down, 0).is_none());

        assert!(cache.complete(&new[0].target, new[0].generation, Ok(FakeBitmap::new(1.0, 1.0, "new"))));
        assert_eq!(cache.get("knight", Facing::Down, 0).unwrap().tag, "new");
    }

    #[test]
    fn replacing_resident_avatar_drops_old_bitmaps() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        cache.ensure_loaded(&avatar("knight", &["old"], &[]));
        finish_all(&mut cache);
        assert!(cache.get("knight", Facing::Down, 0).is_some());

        cache.ensure_loaded(&avatar("knight", &["new"], &[]));
        assert!(cache.get("knight", Facing::Down, 0).is_none());
        finish_all(&mut cache);
        assert_eq!(cache.get("knight", Facing::Down, 0).unwrap().tag, "new");
    }

    #[test]
    fn failed_frames_are_not_retried() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        let knight = avatar("knight", &["bad"], &[]);
        cache.ensure_loaded(&knight);
        let req = cache.drain_requests().remove(0);
        let key = match &req.target {
            AssetTarget::Sprite(k) => k.clone(),
            AssetTarget::Backdrop => unreachable!(),
        };
        assert!(!cache.complete(&req.target, req.generation, Err(AssetError::Sprite(key))));
        assert!(cache.is_failed("knight", Facing::Down, 0));
        assert_eq!(cache.ensure_loaded(&knight), 0);
        assert!(cache.get("knight", Facing::Down, 0).is_none());
    }

    #[test]
    fn backdrop_is_requested_once() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        cache.request_backdrop("world.png");
        cache.request_backdrop("world.png");
        let reqs = cache.drain_requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].target, AssetTarget::Backdrop);
        assert!(cache.backdrop().is_none());
        assert!(cache.complete(&reqs[0].target, reqs[0].generation, Ok(FakeBitmap::new(2048.0, 2048.0, "bg"))));
        assert_eq!(cache.backdrop().unwrap().w, 2048.0);
    }

    #[test]
    fn failed_backdrop_stays_missing() {
        let mut cache = AssetCache::<FakeBitmap>::new();
        cache.request_backdrop("world.png");
        let req = cache.drain_requests().remove(0);
        cache.complete(&req.target, req.generation, Err(AssetError::Backdrop("world.png".into())));
        cache.request_backdrop("world.png");
        assert!(cache.drain_requests().is_empty());
        assert!(cache.backdrop().is_none());
    }
}
