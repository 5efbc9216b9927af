//! Setting keys understood by the built-in node kinds
//!
//! Any other key can be stored on a node; unknown keys only mark the node
//! dirty and are otherwise left to external code.

// Placement
pub const X: &str = "x";
pub const Y: &str = "y";
pub const DX: &str = "dx";
pub const DY: &str = "dy";
/// Pivot, pixels or a percentage of the local bounds
pub const CENTER_X: &str = "center_x";
pub const CENTER_Y: &str = "center_y";
/// Degrees, clockwise
pub const ROTATION: &str = "rotation";
pub const SCALE: &str = "scale";

// Display
pub const VISIBLE: &str = "visible";
pub const FORCE_HIDDEN: &str = "force_hidden";
pub const OPACITY: &str = "opacity";
pub const BLEND_MODE: &str = "blend_mode";
pub const LAYER: &str = "layer";
pub const LAYER_MARGIN: &str = "layer_margin";

// Interaction
pub const INTERACTIVE: &str = "interactive";
pub const DRAGGABLE: &str = "draggable";

// Size
pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const MIN_WIDTH: &str = "min_width";
pub const MIN_HEIGHT: &str = "min_height";
pub const MAX_WIDTH: &str = "max_width";
pub const MAX_HEIGHT: &str = "max_height";

// Container
pub const LAYOUT: &str = "layout";
pub const GRID_COLUMNS: &str = "grid_columns";
pub const GAP: &str = "gap";
pub const PADDING_LEFT: &str = "padding_left";
pub const PADDING_RIGHT: &str = "padding_right";
pub const PADDING_TOP: &str = "padding_top";
pub const PADDING_BOTTOM: &str = "padding_bottom";
pub const REVERSE_CHILDREN: &str = "reverse_children";

// Fill and stroke
pub const FILL: &str = "fill";
pub const FILL_OPACITY: &str = "fill_opacity";
pub const STROKE: &str = "stroke";
pub const STROKE_WIDTH: &str = "stroke_width";
pub const STROKE_OPACITY: &str = "stroke_opacity";
pub const STROKE_DASHARRAY: &str = "stroke_dasharray";
pub const STROKE_DASHOFFSET: &str = "stroke_dashoffset";
pub const LINE_JOIN: &str = "line_join";
pub const LINE_CAP: &str = "line_cap";

// Shadow
pub const SHADOW_COLOR: &str = "shadow_color";
pub const SHADOW_BLUR: &str = "shadow_blur";
pub const SHADOW_OFFSET_X: &str = "shadow_offset_x";
pub const SHADOW_OFFSET_Y: &str = "shadow_offset_y";
pub const SHADOW_OPACITY: &str = "shadow_opacity";

// Shape geometry
pub const CORNER_RADIUS: &str = "corner_radius";
pub const CORNER_RADIUS_TL: &str = "corner_radius_tl";
pub const CORNER_RADIUS_TR: &str = "corner_radius_tr";
pub const CORNER_RADIUS_BR: &str = "corner_radius_br";
pub const CORNER_RADIUS_BL: &str = "corner_radius_bl";
pub const RADIUS: &str = "radius";
pub const RADIUS_Y: &str = "radius_y";
pub const INNER_RADIUS: &str = "inner_radius";
/// Degrees, clockwise from +x
pub const START_ANGLE: &str = "start_angle";
/// Sweep in degrees
pub const ARC: &str = "arc";
pub const SPIKES: &str = "spikes";
/// Flat `[x0, y0, x1, y1, ...]`
pub const POINTS: &str = "points";
pub const SVG_PATH: &str = "svg_path";

// Text
pub const TEXT: &str = "text";
pub const FONT_SIZE: &str = "font_size";
pub const FONT_FAMILY: &str = "font_family";
/// Numeric weight or a keyword such as `bold`
pub const FONT_WEIGHT: &str = "font_weight";
pub const FONT_STYLE: &str = "font_style";
pub const TEXT_ALIGN: &str = "text_align";
pub const OVERSIZED: &str = "oversized";
pub const ELLIPSIS: &str = "ellipsis";
pub const BREAK_WORDS: &str = "break_words";
pub const MIN_SCALE: &str = "min_scale";
pub const LINE_HEIGHT: &str = "line_height";
pub const PARAGRAPH_GAP: &str = "paragraph_gap";
pub const DIRECTION: &str = "direction";
pub const IGNORE_FORMATTING: &str = "ignore_formatting";
/// Lay text along a circle of this radius
pub const TEXT_RADIUS: &str = "text_radius";
pub const TEXT_INSIDE: &str = "text_inside";
pub const TEXT_KERNING: &str = "text_kerning";

/// Keys that move a node inside its parent
pub(crate) const PLACEMENT_KEYS: &[&str] = &[X, Y, DX, DY, CENTER_X, CENTER_Y, ROTATION, SCALE];

/// Keys that change how a node is drawn but not its content or size
pub(crate) const DISPLAY_KEYS: &[&str] = &[
    VISIBLE,
    FORCE_HIDDEN,
    OPACITY,
    BLEND_MODE,
    LAYER,
    LAYER_MARGIN,
    INTERACTIVE,
    DRAGGABLE,
];

/// Keys that change what a node occupies and may move its siblings
pub(crate) const SIZE_KEYS: &[&str] = &[
    WIDTH,
    HEIGHT,
    MIN_WIDTH,
    MIN_HEIGHT,
    MAX_WIDTH,
    MAX_HEIGHT,
    VISIBLE,
    FORCE_HIDDEN,
];

/// Keys a container's child layout depends on
pub(crate) const CONTAINER_LAYOUT_KEYS: &[&str] = &[
    LAYOUT,
    GRID_COLUMNS,
    GAP,
    PADDING_LEFT,
    PADDING_RIGHT,
    PADDING_TOP,
    PADDING_BOTTOM,
    WIDTH,
    HEIGHT,
];

/// Keys holding colors, validated when set
pub(crate) const COLOR_KEYS: &[&str] = &[FILL, STROKE, SHADOW_COLOR];
