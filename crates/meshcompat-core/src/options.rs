/// Chunk size used by the data-parallel flag migrations.
pub const DEFAULT_PARALLEL_GRAIN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    use_old_draw_flags: bool,
    parallel_grain: usize,
    check_layer_counts: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            use_old_draw_flags: false,
            parallel_grain: DEFAULT_PARALLEL_GRAIN,
            check_layer_counts: cfg!(debug_assertions),
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, derived edges are only drawn if one of the face sides they
    /// came from was drawn. Otherwise every edge is drawn.
    pub fn get_use_old_draw_flags(&self) -> bool {
        self.use_old_draw_flags
    }

    pub fn set_use_old_draw_flags(&mut self, value: bool) {
        self.use_old_draw_flags = value;
    }

    pub fn get_parallel_grain(&self) -> usize {
        self.parallel_grain
    }

    /// Zero is treated as one.
    pub fn set_parallel_grain(&mut self, value: usize) {
        self.parallel_grain = value.max(1);
    }

    pub fn get_check_layer_counts(&self) -> bool {
        self.check_layer_counts
    }

    pub fn set_check_layer_counts(&mut self, value: bool) {
        self.check_layer_counts = value;
    }

    pub fn with_use_old_draw_flags(mut self, value: bool) -> Self {
        self.set_use_old_draw_flags(value);
        self
    }

    pub fn with_parallel_grain(mut self, value: usize) -> Self {
        self.set_parallel_grain(value);
        self
    }

    pub fn with_check_layer_counts(mut self, value: bool) -> Self {
        self.set_check_layer_counts(value);
        self
    }
}
