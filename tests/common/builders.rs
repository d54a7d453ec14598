//! Test data builders for creating test objects

use logicnav::{
    Annotation, AnnotationValue, CaptureInfo, NavigationController, NavigatorConfig,
};

/// Builder for a navigation controller with a loaded capture
pub struct NavigatorBuilder {
    config: NavigatorConfig,
    sample_count: u64,
    sample_rate_hz: u32,
    cursors: Vec<(usize, i64)>,
}

impl NavigatorBuilder {
    pub fn new(sample_count: u64) -> Self {
        Self {
            config: NavigatorConfig {
                viewport_width_px: 1000,
                ..Default::default()
            },
            sample_count,
            sample_rate_hz: 1_000_000,
            cursors: Vec::new(),
        }
    }

    pub fn viewport_width(mut self, width: u32) -> Self {
        self.config.viewport_width_px = width;
        self
    }

    pub fn max_scale(mut self, max_scale: f64) -> Self {
        self.config.max_scale = max_scale;
        self
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate_hz = rate;
        self
    }

    pub fn cursor(mut self, index: usize, timestamp: i64) -> Self {
        self.cursors.push((index, timestamp));
        self
    }

    pub fn build(self) -> NavigationController<AnnotationValue> {
        let mut nav = NavigationController::new(self.config);
        nav.load_capture(CaptureInfo::new(self.sample_count, self.sample_rate_hz));
        for (index, timestamp) in self.cursors {
            nav.set_cursor(index, timestamp)
                .expect("builder cursor must lie within the capture");
        }
        nav
    }
}

/// Evenly spaced byte annotations on one channel
///
/// Annotation `i` covers `[i * period, i * period + width - 1]`.
pub fn periodic_annotations(
    channel: usize,
    count: usize,
    period: i64,
    width: i64,
) -> Vec<Annotation<AnnotationValue>> {
    (0..count)
        .map(|i| {
            let start = i as i64 * period;
            Annotation::new(
                channel,
                AnnotationValue::Data(i as u64 & 0xFF),
                start,
                start + width - 1,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigator_builder() {
        let nav = NavigatorBuilder::new(10_000).cursor(2, 500).build();
        assert_eq!(nav.capture().unwrap().sample_count, 10_000);
        assert_eq!(nav.get_cursor(2).unwrap().timestamp(), Some(500));
    }

    #[test]
    fn test_periodic_annotations() {
        let annotations = periodic_annotations(3, 4, 100, 10);
        assert_eq!(annotations.len(), 4);
        assert_eq!(annotations[1].start(), 100);
        assert_eq!(annotations[1].end(), 109);
    }
}
