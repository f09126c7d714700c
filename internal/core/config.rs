// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Tuning parameters of the gesture disambiguator and the scroll physics.
//!
//! The defaults were tuned for a 160 ppi phone and are unlikely to be right for
//! other hardware without retuning.

use core::time::Duration;

/// Error produced when an environment override cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[non_exhaustive]
pub enum ConfigError {
    /// The variable was set but its value is not valid for the parameter.
    #[display("invalid value {value:?} for {name}")]
    InvalidValue {
        /// Name of the environment variable
        name: String,
        /// The rejected value
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GestureConfig {
    /// Distance in view pixels a pointer must travel before the movement counts.
    pub touch_slop: f32,
    /// Maximum distance between two taps of a double tap.
    pub double_tap_slop: f32,
    /// Hit-test tolerance around clickable nodes, in content pixels.
    pub nav_slop: f32,
    /// Ratio between the axes above which a drag snaps to the dominant axis.
    pub max_slope_for_diagonal: f32,
    /// Perpendicular excursion needed to break out of an unlocked axis snap.
    pub min_break_snap_cross_distance: f32,
    /// Reverse travel along the snapped axis that locks the snap.
    pub min_lock_snap_reverse_distance: f32,
    /// `INIT` turns into `SHORTPRESS_START` after this delay.
    pub short_press_timeout: Duration,
    pub long_press_timeout: Duration,
    pub double_tap_timeout: Duration,
    /// How long the widget waits for a prevent-default answer before proceeding.
    pub prevent_default_timeout: Duration,
    /// A drag released later than this after the last move does not fling.
    pub fling_window: Duration,
    /// Minimum interval between two forwarded move events.
    pub touch_interval: Duration,
    /// Speed used to derive the duration of pinned scroll animations, in pixels per second.
    pub standard_scroll_speed: f32,
    pub max_scroll_duration: Duration,
    /// Flings use this fraction of the tracked finger velocity.
    pub fling_velocity_scale: f32,
    /// A new fling accelerates the running one only if it is at least this fraction of its peak speed.
    pub min_velocity_ratio_for_acceleration: f32,
    /// Friction coefficient of the fling trajectory.
    pub scroll_friction: f32,
    pub pixels_per_inch: f32,
    /// Overlap kept between two consecutive pages for page up and page down.
    pub page_scroll_overlap: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop: 10.,
            double_tap_slop: 100.,
            nav_slop: 12.,
            max_slope_for_diagonal: 1.5,
            min_break_snap_cross_distance: 80.,
            min_lock_snap_reverse_distance: 10.,
            short_press_timeout: Duration::from_millis(200),
            long_press_timeout: Duration::from_millis(1000),
            double_tap_timeout: Duration::from_millis(300),
            prevent_default_timeout: Duration::from_millis(200),
            fling_window: Duration::from_millis(50),
            touch_interval: Duration::from_millis(16),
            standard_scroll_speed: 480.,
            max_scroll_duration: Duration::from_millis(750),
            fling_velocity_scale: 0.75,
            min_velocity_ratio_for_acceleration: 0.2,
            scroll_friction: 0.015,
            pixels_per_inch: 160.,
            page_scroll_overlap: 24.,
        }
    }
}

/// Standard gravity, in meters per second squared.
const GRAVITY_EARTH: f32 = 9.80665;
const INCHES_PER_METER: f32 = 39.37;

impl GestureConfig {
    pub fn touch_slop_squared(&self) -> f32 {
        self.touch_slop * self.touch_slop
    }

    pub fn double_tap_slop_squared(&self) -> f32 {
        self.double_tap_slop * self.double_tap_slop
    }

    /// Deceleration of a fling in pixels per second squared.
    pub fn fling_deceleration(&self) -> f32 {
        GRAVITY_EARTH * INCHES_PER_METER * self.pixels_per_inch * self.scroll_friction
    }

    /// The default configuration with `WEBVIEW_<PARAMETER>` environment overrides applied.
    ///
    /// Durations are given in milliseconds. Invalid values are reported with `log::warn!`
    /// and leave the default in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for error in config.apply_overrides(|name| std::env::var(name).ok()) {
            log::warn!("Ignoring gesture configuration override: {error}");
        }
        config
    }

    /// Apply overrides looked up through `lookup`, returning the ones that failed to parse.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        macro_rules! override_field {
            ($($field:ident: $kind:ident),* $(,)?) => {
                $(
                    let name = concat!("WEBVIEW_", stringify!($field)).to_ascii_uppercase();
                    if let Some(value) = lookup(&name) {
                        match override_field!(@parse $kind, value.trim()) {
                            Some(parsed) => self.$field = parsed,
                            None => errors.push(ConfigError::InvalidValue { name, value }),
                        }
                    }
                )*
            };
            (@parse f32, $value:expr) => {
                $value.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.)
            };
            (@parse millis, $value:expr) => {
                $value.parse::<u64>().ok().map(Duration::from_millis)
            };
        }

        override_field!(
            touch_slop: f32,
            double_tap_slop: f32,
            nav_slop: f32,
            max_slope_for_diagonal: f32,
            min_break_snap_cross_distance: f32,
            min_lock_snap_reverse_distance: f32,
            short_press_timeout: millis,
            long_press_timeout: millis,
            double_tap_timeout: millis,
            prevent_default_timeout: millis,
            fling_window: millis,
            touch_interval: millis,
            standard_scroll_speed: f32,
            max_scroll_duration: millis,
            fling_velocity_scale: f32,
            min_velocity_ratio_for_acceleration: f32,
            scroll_friction: f32,
            pixels_per_inch: f32,
            page_scroll_overlap: f32,
        );

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_are_parsed() {
        let mut config = GestureConfig::default();
        let errors = config.apply_overrides(|name| match name {
            "WEBVIEW_TOUCH_SLOP" => Some("16".into()),
            "WEBVIEW_LONG_PRESS_TIMEOUT" => Some(" 600 ".into()),
            "WEBVIEW_FLING_WINDOW" => Some("soon".into()),
            _ => None,
        });
        assert_eq!(config.touch_slop, 16.);
        assert_eq!(config.touch_slop_squared(), 256.);
        assert_eq!(config.long_press_timeout, Duration::from_millis(600));
        assert_eq!(config.fling_window, GestureConfig::default().fling_window);
        assert_eq!(
            errors,
            vec![ConfigError::InvalidValue {
                name: "WEBVIEW_FLING_WINDOW".into(),
                value: "soon".into()
            }]
        );
    }

    #[test]
    fn default_deceleration() {
        let decel = GestureConfig::default().fling_deceleration();
        assert!((decel - 926.6).abs() < 1., "{decel}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: GestureConfig = serde_json::from_str(r#"{"touch_slop": 8.0}"#).unwrap();
        assert_eq!(config.touch_slop, 8.);
        assert_eq!(config.long_press_timeout, Duration::from_millis(1000));
    }
}
