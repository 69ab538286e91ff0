use model::{DevicePx, PartIndex, Rect, Size, TotalScale, Twips};

use crate::render::{RenderOutcome, TileJobKey};
use crate::{TileGrid, TileGridConfig};

/// One `TileGrid` per document part.
#[derive(Debug)]
pub struct TileGridSet {
    config: TileGridConfig,
    grids: Vec<TileGrid>,
    next_generation: u64,
}

impl TileGridSet {
    pub fn new(config: TileGridConfig) -> Self {
        Self {
            config,
            grids: Vec::new(),
            next_generation: 1,
        }
    }

    pub fn config(&self) -> TileGridConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Matches the set to `part_count` parts at `scale`.
    ///
    /// Grids past `part_count` are dropped from the tail and new parts get fresh grids.
    /// A grid built for another scale or document size is replaced, never rescaled.
    pub fn resize(&mut self, part_count: usize, scale: TotalScale, document_size: Size<Twips>) {
        if part_count < self.grids.len() {
            tracing::debug!(
                "[tiles] dropping {} trailing grid(s)",
                self.grids.len() - part_count
            );
            self.grids.truncate(part_count);
        }
        for part in 0..self.grids.len() {
            let stale = {
                let grid = &self.grids[part];
                grid.scale() != scale || grid.document_size() != document_size
            };
            if stale {
                let generation = self.bump_generation();
                tracing::debug!(
                    "[tiles] rebuilding grid part={part} scale={} generation={generation}",
                    scale.value()
                );
                self.grids[part] =
                    TileGrid::new(part, scale, document_size, self.config, generation);
            }
        }
        while self.grids.len() < part_count {
            let part = self.grids.len();
            let generation = self.bump_generation();
            self.grids
                .push(TileGrid::new(part, scale, document_size, self.config, generation));
        }
    }

    /// # Panics
    /// Panics if `part` has no grid.
    pub fn grid(&self, part: PartIndex) -> &TileGrid {
        assert!(
            part < self.grids.len(),
            "part index {part} out of range for {} grid(s)",
            self.grids.len()
        );
        &self.grids[part]
    }

    /// # Panics
    /// Panics if `part` has no grid.
    pub fn grid_mut(&mut self, part: PartIndex) -> &mut TileGrid {
        assert!(
            part < self.grids.len(),
            "part index {part} out of range for {} grid(s)",
            self.grids.len()
        );
        &mut self.grids[part]
    }

    pub fn get(&self, part: PartIndex) -> Option<&TileGrid> {
        self.grids.get(part)
    }

    pub fn get_mut(&mut self, part: PartIndex) -> Option<&mut TileGrid> {
        self.grids.get_mut(part)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileGrid> {
        self.grids.iter()
    }

    pub fn invalidate_all(&mut self) {
        for grid in &mut self.grids {
            grid.invalidate_all();
        }
    }

    pub fn clear(&mut self) {
        self.grids.clear();
    }

    /// Routes a late render result to its grid. See `TileGrid::complete_render`.
    pub fn complete_render(
        &mut self,
        key: TileJobKey,
        outcome: RenderOutcome,
    ) -> Option<Rect<DevicePx>> {
        let grid = self.grids.get_mut(key.part)?;
        grid.complete_render(key, outcome)
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}
