//! Character-grid aspect ratios and their lenient settings format.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Aspect ratio applied to the character grid.
///
/// Deserialization is lenient: any label that does not name a known ratio
/// resolves to [`AspectRatio::OneToOne`].
#[derive(
    Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 16:9
    SixteenToNine,
    /// 16:10
    SixteenToTen,
    /// 3:2
    ThreeToTwo,
    /// 4:3
    FourToThree,
    /// 5:4
    FiveToFour,
    /// 1:1
    #[default]
    OneToOne,
}

impl AspectRatio {
    /// Every selectable ratio, in menu order.
    pub const ALL: [Self; 6] = [
        Self::SixteenToNine,
        Self::SixteenToTen,
        Self::ThreeToTwo,
        Self::FourToThree,
        Self::FiveToFour,
        Self::OneToOne,
    ];

    /// `(numerator, denominator)` of the ratio, swapped when `flip` is set.
    #[must_use]
    pub fn ratio(self, flip: bool) -> (u32, u32) {
        let (num, den) = match self {
            Self::SixteenToNine => (16, 9),
            Self::SixteenToTen => (16, 10),
            Self::ThreeToTwo => (3, 2),
            Self::FourToThree => (4, 3),
            Self::FiveToFour => (5, 4),
            Self::OneToOne => (1, 1),
        };
        if flip {
            (den, num)
        } else {
            (num, den)
        }
    }

    /// Display label, e.g. `"16:9"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SixteenToNine => "16:9",
            Self::SixteenToTen => "16:10",
            Self::ThreeToTwo => "3:2",
            Self::FourToThree => "4:3",
            Self::FiveToFour => "5:4",
            Self::OneToOne => "1:1",
        }
    }

    /// Parse either the snake_case name or the `"w:h"` label. Unknown
    /// labels fall back to 1:1.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        Self::ALL
            .into_iter()
            .find(|ratio| {
                ratio.label() == trimmed || ratio.snake_name() == trimmed
            })
            .unwrap_or_else(|| {
                log::warn!("Unknown aspect ratio '{trimmed}', using 1:1");
                Self::OneToOne
            })
    }

    /// Map a legacy integer selector (menu index) to a ratio. Out-of-range
    /// values fall back to 1:1.
    #[must_use]
    pub fn from_index(index: i64) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(Self::OneToOne)
    }

    fn snake_name(self) -> &'static str {
        match self {
            Self::SixteenToNine => "sixteen_to_nine",
            Self::SixteenToTen => "sixteen_to_ten",
            Self::ThreeToTwo => "three_to_two",
            Self::FourToThree => "four_to_three",
            Self::FiveToFour => "five_to_four",
            Self::OneToOne => "one_to_one",
        }
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Label(String),
            Index(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Label(label) => Self::from_label(&label),
            Repr::Index(index) => Self::from_index(index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_swaps_every_ratio() {
        for ratio in AspectRatio::ALL {
            let (num, den) = ratio.ratio(false);
            assert_eq!(ratio.ratio(true), (den, num), "{ratio:?}");
        }
    }

    #[test]
    fn labels_and_names_parse() {
        assert_eq!(AspectRatio::from_label("16:9"), AspectRatio::SixteenToNine);
        assert_eq!(
            AspectRatio::from_label("five_to_four"),
            AspectRatio::FiveToFour
        );
        assert_eq!(AspectRatio::from_label("21:9"), AspectRatio::OneToOne);
    }

    #[test]
    fn legacy_index_falls_back() {
        assert_eq!(AspectRatio::from_index(3), AspectRatio::FourToThree);
        assert_eq!(AspectRatio::from_index(42), AspectRatio::OneToOne);
        assert_eq!(AspectRatio::from_index(-1), AspectRatio::OneToOne);
    }
}
