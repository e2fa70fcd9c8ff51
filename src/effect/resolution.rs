//! Character-grid resolution derived from the output surface.

use glam::UVec2;

use super::aspect::AspectRatio;

/// Character grid size `(columns, rows)` the composite shader draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedResolution {
    /// Number of glyph columns.
    pub columns: u32,
    /// Number of glyph rows.
    pub rows: u32,
}

impl ResolvedResolution {
    /// Compute the grid for a surface.
    ///
    /// `rows = floor(columns * height / width * num / den)`, evaluated in
    /// integer arithmetic so the result is exact. A zero-width surface
    /// produces zero rows.
    #[must_use]
    pub fn compute(
        surface: UVec2,
        columns: u32,
        aspect: AspectRatio,
        flip: bool,
    ) -> Self {
        let (num, den) = aspect.ratio(flip);
        let divisor = u64::from(surface.x) * u64::from(den);
        let rows = if divisor == 0 {
            0
        } else {
            let dividend =
                u64::from(columns) * u64::from(surface.y) * u64::from(num);
            u32::try_from(dividend / divisor).unwrap_or(u32::MAX)
        };
        Self { columns, rows }
    }

    /// The grid as a vector, for shader upload.
    #[must_use]
    pub fn as_uvec2(self) -> UVec2 {
        UVec2::new(self.columns, self.rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolverKey {
    surface: UVec2,
    columns: u32,
    aspect: AspectRatio,
    flip: bool,
}

/// Caches the last [`ResolvedResolution`] and recomputes it only when one
/// of its inputs changed.
#[derive(Debug, Default)]
pub struct ResolutionResolver {
    cached: Option<(ResolverKey, ResolvedResolution)>,
    recomputes: u64,
}

impl ResolutionResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the grid for the given inputs, recomputing only on change.
    pub fn resolve(
        &mut self,
        surface: UVec2,
        columns: u32,
        aspect: AspectRatio,
        flip: bool,
    ) -> ResolvedResolution {
        let key = ResolverKey {
            surface,
            columns,
            aspect,
            flip,
        };
        if let Some((cached_key, resolved)) = self.cached {
            if cached_key == key {
                return resolved;
            }
        }

        let resolved =
            ResolvedResolution::compute(surface, columns, aspect, flip);
        log::debug!(
            "ASCII grid {}x{} for surface {}x{}",
            resolved.columns,
            resolved.rows,
            surface.x,
            surface.y
        );
        self.cached = Some((key, resolved));
        self.recomputes += 1;
        resolved
    }

    /// Last resolved grid, if any.
    #[must_use]
    pub fn current(&self) -> Option<ResolvedResolution> {
        self.cached.map(|(_, resolved)| resolved)
    }

    /// Drop the cache so the next [`resolve`](Self::resolve) recomputes.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// How many times the grid has been recomputed.
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hd_square_cells() {
        let res = ResolvedResolution::compute(
            UVec2::new(1920, 1080),
            128,
            AspectRatio::OneToOne,
            false,
        );
        assert_eq!(res, ResolvedResolution { columns: 128, rows: 72 });
    }

    #[test]
    fn rows_follow_floor_formula() {
        let cases = [
            (UVec2::new(1920, 1080), 128, AspectRatio::SixteenToNine, false),
            (UVec2::new(1280, 720), 96, AspectRatio::FourToThree, true),
            (UVec2::new(800, 600), 64, AspectRatio::ThreeToTwo, false),
            (UVec2::new(333, 777), 17, AspectRatio::FiveToFour, true),
        ];
        for (surface, columns, aspect, flip) in cases {
            let (num, den) = aspect.ratio(flip);
            let expected = (f64::from(columns) * f64::from(surface.y)
                / f64::from(surface.x)
                * f64::from(num)
                / f64::from(den))
            .floor() as u32;
            let res =
                ResolvedResolution::compute(surface, columns, aspect, flip);
            assert_eq!(res.rows, expected, "{surface:?} {aspect:?} {flip}");
        }
    }

    #[test]
    fn sixteen_nine_on_full_hd() {
        // 128 * 1080/1920 * 16/9 = 128
        let res = ResolvedResolution::compute(
            UVec2::new(1920, 1080),
            128,
            AspectRatio::SixteenToNine,
            false,
        );
        assert_eq!(res.rows, 128);
    }

    #[test]
    fn zero_width_surface_has_no_rows() {
        let res = ResolvedResolution::compute(
            UVec2::new(0, 1080),
            128,
            AspectRatio::OneToOne,
            false,
        );
        assert_eq!(res.rows, 0);
    }

    #[test]
    fn resolver_only_recomputes_on_change() {
        let mut resolver = ResolutionResolver::new();
        let surface = UVec2::new(1920, 1080);
        let first =
            resolver.resolve(surface, 128, AspectRatio::OneToOne, false);
        let second =
            resolver.resolve(surface, 128, AspectRatio::OneToOne, false);
        assert_eq!(first, second);
        assert_eq!(resolver.recompute_count(), 1);

        let resized = resolver.resolve(
            UVec2::new(1280, 720),
            128,
            AspectRatio::OneToOne,
            false,
        );
        assert_eq!(resized.rows, 72);
        assert_eq!(resolver.recompute_count(), 2);

        let _ = resolver.resolve(
            UVec2::new(1280, 720),
            64,
            AspectRatio::OneToOne,
            false,
        );
        let _ = resolver.resolve(
            UVec2::new(1280, 720),
            64,
            AspectRatio::OneToOne,
            true,
        );
        assert_eq!(resolver.recompute_count(), 4);

        resolver.invalidate();
        assert!(resolver.current().is_none());
    }
}
