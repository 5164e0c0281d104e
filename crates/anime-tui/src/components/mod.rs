pub mod carousel;
pub mod help_overlay;
pub mod popular;
pub mod schedule;
