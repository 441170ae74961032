//! Chart descriptors and the builder that produces them.

pub mod builder;
pub mod descriptor;

pub use builder::{
    build, build_categorized, build_comparison, build_pie, build_single, label_style_for_window, legend_label,
};
pub use descriptor::{
    AxisConfig, Category, ChartDescriptor, ChartKind, ChartOptions, DEFAULT_COLOR, DescriptorSeries, LabelStyle,
    LegendConfig, LegendPosition, PALETTE, palette_color,
};
