//! Container child layout
//!
//! A container arranges its visible children according to its `layout`
//! setting. Absolute layout leaves children at their own `x`/`y`; the flow
//! layouts compute an offset per child from the children's bounds, which
//! replaces the child's `x`/`y` until the layout changes back.

use std::str::FromStr;

use strata_core::{Bounds, Point, PropertyStore, Rect};

use crate::keys;

/// How a container places its children
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContainerLayout {
    #[default]
    Absolute,
    /// Left to right
    Horizontal,
    /// Top to bottom
    Vertical,
    /// Rows of columns, as many columns as fit the available width
    Grid,
}

impl FromStr for ContainerLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "absolute" | "none" => Ok(ContainerLayout::Absolute),
            "horizontal" => Ok(ContainerLayout::Horizontal),
            "vertical" => Ok(ContainerLayout::Vertical),
            "grid" => Ok(ContainerLayout::Grid),
            other => Err(format!("unknown layout '{other}'")),
        }
    }
}

impl ContainerLayout {
    pub(crate) fn from_settings(settings: &PropertyStore) -> Self {
        settings
            .get_text(keys::LAYOUT)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn is_flow(self) -> bool {
        self != ContainerLayout::Absolute
    }
}

/// Container padding
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Padding {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Padding {
    pub(crate) fn from_settings(settings: &PropertyStore) -> Self {
        Self {
            left: settings.get_number(keys::PADDING_LEFT, 0.0),
            right: settings.get_number(keys::PADDING_RIGHT, 0.0),
            top: settings.get_number(keys::PADDING_TOP, 0.0),
            bottom: settings.get_number(keys::PADDING_BOTTOM, 0.0),
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Compute an offset for each child
///
/// `items` are the children's bounds with rotation and scale applied but no
/// translation; an empty bounds occupies no space. `inner` is the content
/// box the children flow in; its width limits the grid's column count.
pub fn arrange(
    layout: ContainerLayout,
    items: &[Bounds],
    inner: Rect,
    gap: f32,
    columns: Option<usize>,
) -> Vec<Point> {
    match layout {
        ContainerLayout::Absolute => vec![Point::ZERO; items.len()],
        ContainerLayout::Horizontal => flow(items, inner, gap, true),
        ContainerLayout::Vertical => flow(items, inner, gap, false),
        ContainerLayout::Grid => grid(items, inner, gap, columns),
    }
}

fn flow(items: &[Bounds], inner: Rect, gap: f32, horizontal: bool) -> Vec<Point> {
    let mut cursor = if horizontal { inner.x() } else { inner.y() };
    let mut offsets = Vec::with_capacity(items.len());
    for (i, b) in items.iter().enumerate() {
        if i > 0 {
            cursor += gap;
        }
        let b = b.or_zero();
        if horizontal {
            offsets.push(Point::new(cursor - b.left, inner.y() - b.top));
            cursor += b.width();
        } else {
            offsets.push(Point::new(inner.x() - b.left, cursor - b.top));
            cursor += b.height();
        }
    }
    offsets
}

fn grid(items: &[Bounds], inner: Rect, gap: f32, columns: Option<usize>) -> Vec<Point> {
    if items.is_empty() {
        return Vec::new();
    }
    let items: Vec<Bounds> = items.iter().map(|b| b.or_zero()).collect();
    let mut count = columns.unwrap_or(items.len()).clamp(1, items.len());
    let mut widths = column_widths(&items, count);
    if columns.is_none() && inner.width().is_finite() {
        while count > 1 && total(&widths, gap) > inner.width() {
            count -= 1;
            widths = column_widths(&items, count);
        }
    }

    let rows = items.len().div_ceil(count);
    let mut heights = vec![0.0f32; rows];
    for (i, b) in items.iter().enumerate() {
        heights[i / count] = heights[i / count].max(b.height());
    }

    items
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let (row, col) = (i / count, i % count);
            let x = inner.x() + widths[..col].iter().sum::<f32>() + gap * col as f32;
            let y = inner.y() + heights[..row].iter().sum::<f32>() + gap * row as f32;
            Point::new(x - b.left, y - b.top)
        })
        .collect()
}

fn column_widths(items: &[Bounds], count: usize) -> Vec<f32> {
    let mut widths = vec![0.0f32; count];
    for (i, b) in items.iter().enumerate() {
        widths[i % count] = widths[i % count].max(b.width());
    }
    widths
}

fn total(widths: &[f32], gap: f32) -> f32 {
    widths.iter().sum::<f32>() + gap * widths.len().saturating_sub(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(sizes: &[(f32, f32)]) -> Vec<Bounds> {
        sizes
            .iter()
            .map(|&(w, h)| Bounds::new(0.0, 0.0, w, h))
            .collect()
    }

    #[test]
    fn test_parse_layout() {
        assert_eq!("grid".parse::<ContainerLayout>().unwrap(), ContainerLayout::Grid);
        assert!("diagonal".parse::<ContainerLayout>().is_err());
    }

    #[test]
    fn test_horizontal_with_gap_and_padding() {
        let items = boxes(&[(10.0, 5.0), (20.0, 8.0), (5.0, 5.0)]);
        let offsets = arrange(
            ContainerLayout::Horizontal,
            &items,
            Rect::new(2.0, 3.0, 100.0, 50.0),
            1.0,
            None,
        );
        assert_eq!(
            offsets,
            vec![Point::new(2.0, 3.0), Point::new(13.0, 3.0), Point::new(34.0, 3.0)]
        );
    }

    #[test]
    fn test_vertical_compensates_for_bounds_origin() {
        // A circle of radius 5 has bounds starting at -5
        let items = vec![Bounds::new(-5.0, -5.0, 5.0, 5.0), Bounds::new(0.0, 0.0, 4.0, 4.0)];
        let offsets = arrange(ContainerLayout::Vertical, &items, Rect::new(0.0, 0.0, 50.0, 50.0), 0.0, None);
        assert_eq!(offsets, vec![Point::new(5.0, 5.0), Point::new(0.0, 10.0)]);
    }

    #[test]
    fn test_empty_items_take_no_space() {
        let items = vec![Bounds::EMPTY, Bounds::new(0.0, 0.0, 4.0, 4.0)];
        let offsets = arrange(ContainerLayout::Horizontal, &items, Rect::new(0.0, 0.0, 50.0, 50.0), 0.0, None);
        assert_eq!(offsets[1], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_grid_fits_columns_to_width() {
        let items = boxes(&[(30.0, 10.0), (30.0, 20.0), (30.0, 10.0), (30.0, 10.0)]);
        let offsets = arrange(ContainerLayout::Grid, &items, Rect::new(0.0, 0.0, 70.0, 100.0), 0.0, None);
        // Two 30px columns fit into 70px, three do not
        assert_eq!(
            offsets,
            vec![
                Point::new(0.0, 0.0),
                Point::new(30.0, 0.0),
                Point::new(0.0, 20.0),
                Point::new(30.0, 20.0),
            ]
        );
    }

    #[test]
    fn test_grid_fixed_columns() {
        let items = boxes(&[(10.0, 10.0), (20.0, 10.0), (10.0, 10.0)]);
        let offsets = arrange(ContainerLayout::Grid, &items, Rect::new(0.0, 0.0, 5.0, 5.0), 2.0, Some(3));
        assert_eq!(offsets[2], Point::new(34.0, 0.0));
    }

    #[test]
    fn test_absolute_is_identity() {
        let items = boxes(&[(10.0, 10.0)]);
        assert_eq!(
            arrange(ContainerLayout::Absolute, &items, Rect::ZERO, 0.0, None),
            vec![Point::ZERO]
        );
    }
}
