// Rendered-element registry
//
// A Scene holds the rendered elements of one family. Each element carries
// a geometry track and an opacity track that are sampled at draw time, so a
// new cycle can start while the previous one is still animating: the diff
// runs against the logical key set, and new transitions start from
// whatever the element currently looks like.

use super::{diff, AnimationPlan, Choreography, KeyedDiff, Phase};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Opacity of elements that exist but should not be visible yet
pub const NEAR_ZERO_OPACITY: f64 = 0.000001;

/// Visual state that can be interpolated between two values
pub trait Tween: Clone {
    /// Value at fraction `t` (0.0 ~ 1.0) of the way from `self` to `to`
    fn tween(&self, to: &Self, t: f64) -> Self;

    /// Final look of an element animating out
    fn retired(&self) -> Self {
        self.clone()
    }
}

impl Tween for f64 {
    fn tween(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

#[derive(Debug, Clone)]
struct Track<T> {
    from: T,
    to: T,
    start: Instant,
    duration: Duration,
}

impl<T: Tween> Track<T> {
    fn new(from: T, to: T, start: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    fn fixed(value: T, at: Instant) -> Self {
        Self::new(value.clone(), value, at, Duration::ZERO)
    }

    fn sample(&self, now: Instant) -> T {
        if now < self.start {
            return self.from.clone();
        }
        let elapsed = now - self.start;
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to.clone();
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.tween(&self.to, t)
    }
}

#[derive(Debug, Clone)]
struct Element<V> {
    geometry: Track<V>,
    opacity: Track<f64>,
    remove_at: Option<Instant>,
}

/// An element as it should be drawn at a given instant
#[derive(Debug, Clone, PartialEq)]
pub struct Visible<'a, K, V> {
    pub key: &'a K,
    pub visual: V,
    pub opacity: f64,
    /// True while the element is animating out
    pub retiring: bool,
}

/// Registry of rendered elements for one family
#[derive(Debug, Clone)]
pub struct Scene<K, V> {
    elements: HashMap<K, Element<V>>,
    /// Keys of the last reconciliation target, in order
    order: Vec<K>,
    /// Keys animating out, in the order they started exiting
    retiring: Vec<K>,
}

impl<K, V> Default for Scene<K, V> {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
            order: Vec::new(),
            retiring: Vec::new(),
        }
    }
}

impl<K, V> Scene<K, V>
where
    K: Clone + Eq + Hash,
    V: Tween,
{
    /// Keys of the last reconciliation target
    #[cfg(test)]
    pub fn logical_keys(&self) -> &[K] {
        &self.order
    }

    /// Number of elements still on screen, including retiring ones
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Diff `next` against the logical set and schedule the transitions
    ///
    /// If a key appears more than once in `next`, the first value wins.
    pub fn reconcile(
        &mut self,
        next: Vec<(K, V)>,
        now: Instant,
        choreography: &Choreography,
    ) -> KeyedDiff<K> {
        self.prune(now);

        let next_keys: Vec<K> = next.iter().map(|(key, _)| key.clone()).collect();
        let result = diff(&self.order, &next_keys);
        let plan = AnimationPlan::from_diff(&result, choreography);
        let entering: HashSet<&K> = result.entering.iter().collect();

        let mut targets: HashMap<K, V> = HashMap::with_capacity(next.len());
        for (key, value) in next {
            targets.entry(key).or_insert(value);
        }

        for step in &plan.steps {
            let start = now + step.delay;
            for key in &step.keys {
                match step.phase {
                    Phase::FadeOut => self.schedule_exit(key, now, start, step.duration),
                    Phase::Settle => {
                        let Some(target) = targets.remove(key) else {
                            continue;
                        };
                        if entering.contains(key) {
                            self.place_entering(key, target, start);
                        } else {
                            self.schedule_update(key, target, now, start, step.duration);
                        }
                    }
                    Phase::FadeIn => {
                        if let Some(element) = self.elements.get_mut(key) {
                            element.opacity =
                                Track::new(NEAR_ZERO_OPACITY, 1.0, start, step.duration);
                        }
                    }
                }
            }
        }

        let mut order = Vec::with_capacity(result.updating.len() + result.entering.len());
        let mut placed: HashSet<K> = HashSet::with_capacity(order.capacity());
        for key in next_keys {
            if self.elements.contains_key(&key) && placed.insert(key.clone()) {
                order.push(key);
            }
        }
        self.order = order;

        result
    }

    fn schedule_exit(&mut self, key: &K, now: Instant, start: Instant, duration: Duration) {
        let Some(element) = self.elements.get_mut(key) else {
            return;
        };
        let current = element.geometry.sample(now);
        let opacity = element.opacity.sample(now);
        let retired = current.retired();
        element.geometry = Track::new(current, retired, start, duration);
        element.opacity = Track::new(opacity, NEAR_ZERO_OPACITY, start, duration);
        element.remove_at = Some(start + duration);
        self.retiring.push(key.clone());
    }

    fn schedule_update(
        &mut self,
        key: &K,
        target: V,
        now: Instant,
        start: Instant,
        duration: Duration,
    ) {
        let Some(element) = self.elements.get_mut(key) else {
            return;
        };
        let current = element.geometry.sample(now);
        let opacity = element.opacity.sample(now);
        element.geometry = Track::new(current, target, start, duration);
        element.opacity = Track::new(opacity, 1.0, start, duration);
        element.remove_at = None;
    }

    fn place_entering(&mut self, key: &K, target: V, start: Instant) {
        // A key coming back while still animating out starts over
        self.retiring.retain(|retiring| retiring != key);
        self.elements.insert(
            key.clone(),
            Element {
                geometry: Track::fixed(target, start),
                opacity: Track::fixed(NEAR_ZERO_OPACITY, start),
                remove_at: None,
            },
        );
    }

    /// Drop retiring elements whose fade-out has finished
    pub fn prune(&mut self, now: Instant) {
        let elements = &mut self.elements;
        self.retiring.retain(|key| {
            let done = elements
                .get(key)
                .and_then(|element| element.remove_at)
                .map_or(true, |remove_at| remove_at <= now);
            if done {
                elements.remove(key);
            }
            !done
        });
    }

    /// Sampled state of one element
    pub fn sample(&self, key: &K, now: Instant) -> Option<(V, f64)> {
        self.elements
            .get(key)
            .map(|element| (element.geometry.sample(now), element.opacity.sample(now)))
    }

    /// Everything to draw at `now`: retiring elements first, then the
    /// logical set in target order
    pub fn visible(&self, now: Instant) -> Vec<Visible<'_, K, V>> {
        let retiring = self.retiring.iter().map(|key| (key, true));
        let current = self.order.iter().map(|key| (key, false));

        retiring
            .chain(current)
            .filter_map(|(key, retiring)| {
                self.elements.get(key).map(|element| Visible {
                    key,
                    visual: element.geometry.sample(now),
                    opacity: element.opacity.sample(now),
                    retiring,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn entries(values: &[(&str, f64)]) -> Vec<(String, f64)> {
        values
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn test_entering_fades_in_during_third_phase() {
        let t0 = Instant::now();
        let choreography = Choreography::new(STEP);
        let mut scene: Scene<String, f64> = Scene::default();

        let result = scene.reconcile(entries(&[("a", 10.0)]), t0, &choreography);
        assert_eq!(result.entering, vec!["a".to_string()]);

        let key = "a".to_string();
        // Already at final geometry, effectively invisible
        let (value, opacity) = scene.sample(&key, t0 + ms(150)).unwrap();
        assert_eq!(value, 10.0);
        assert!(opacity <= NEAR_ZERO_OPACITY);

        let (_, opacity) = scene.sample(&key, t0 + ms(250)).unwrap();
        assert!(opacity > 0.4 && opacity < 0.6);

        let (_, opacity) = scene.sample(&key, t0 + ms(300)).unwrap();
        assert_eq!(opacity, 1.0);
    }

    #[test]
    fn test_updating_moves_during_second_phase() {
        let t0 = Instant::now();
        let choreography = Choreography::new(STEP);
        let mut scene: Scene<String, f64> = Scene::default();
        scene.reconcile(entries(&[("a", 0.0)]), t0, &choreography);

        let t1 = t0 + ms(1000);
        scene.reconcile(entries(&[("a", 100.0)]), t1, &choreography);

        let key = "a".to_string();
        assert_eq!(scene.sample(&key, t1 + ms(50)).unwrap().0, 0.0);
        let (mid, _) = scene.sample(&key, t1 + ms(150)).unwrap();
        assert!((mid - 50.0).abs() < 1.0);
        assert_eq!(scene.sample(&key, t1 + ms(200)).unwrap(), (100.0, 1.0));
    }

    #[test]
    fn test_exiting_fades_out_then_is_pruned() {
        let t0 = Instant::now();
        let choreography = Choreography::new(STEP);
        let mut scene: Scene<String, f64> = Scene::default();
        scene.reconcile(entries(&[("a", 1.0), ("b", 2.0)]), t0, &choreography);

        let t1 = t0 + ms(1000);
        scene.reconcile(entries(&[("b", 2.0)]), t1, &choreography);
        assert_eq!(scene.logical_keys(), &["b".to_string()]);
        assert_eq!(scene.len(), 2);

        let visible = scene.visible(t1 + ms(50));
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].key, "a");
        assert!(visible[0].retiring);
        assert!(visible[0].opacity < 1.0 && visible[0].opacity > 0.0);

        scene.prune(t1 + ms(100));
        assert_eq!(scene.len(), 1);
        assert!(scene.sample(&"a".to_string(), t1 + ms(100)).is_none());
    }

    #[test]
    fn test_overlapping_cycle_starts_from_current_state() {
        let t0 = Instant::now();
        let choreography = Choreography::new(STEP);
        let mut scene: Scene<String, f64> = Scene::default();
        scene.reconcile(entries(&[("a", 0.0)]), t0, &choreography);
        scene.reconcile(entries(&[("a", 100.0)]), t0 + ms(1000), &choreography);

        // Halfway through the move, a new target arrives
        let t2 = t0 + ms(1150);
        let (midway, _) = scene.sample(&"a".to_string(), t2).unwrap();
        let result = scene.reconcile(entries(&[("a", 0.0)]), t2, &choreography);
        assert_eq!(result.updating, vec!["a".to_string()]);
        assert!(result.entering.is_empty());

        // Holds its mid-flight value until the settle phase begins
        let (held, _) = scene.sample(&"a".to_string(), t2 + ms(50)).unwrap();
        assert!((held - midway).abs() < 1e-9);
    }

    #[test]
    fn test_reentering_key_replaces_retiring_element() {
        let t0 = Instant::now();
        let choreography = Choreography::new(STEP);
        let mut scene: Scene<String, f64> = Scene::default();
        scene.reconcile(entries(&[("a", 1.0)]), t0, &choreography);
        scene.reconcile(Vec::new(), t0 + ms(1000), &choreography);

        let result = scene.reconcile(entries(&[("a", 5.0)]), t0 + ms(1050), &choreography);
        assert_eq!(result.entering, vec!["a".to_string()]);
        assert!(result.exiting.is_empty());

        let visible = scene.visible(t0 + ms(1060));
        assert_eq!(visible.len(), 1);
        assert!(!visible[0].retiring);
        assert_eq!(visible[0].visual, 5.0);

        // Its old removal deadline no longer applies
        scene.prune(t0 + ms(1200));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_instant_choreography_settles_immediately() {
        let t0 = Instant::now();
        let choreography = Choreography::instant();
        let mut scene: Scene<String, f64> = Scene::default();
        scene.reconcile(entries(&[("a", 1.0)]), t0, &choreography);
        assert_eq!(scene.sample(&"a".to_string(), t0).unwrap(), (1.0, 1.0));

        scene.reconcile(Vec::new(), t0, &choreography);
        scene.prune(t0);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_duplicate_keys_keep_first_value() {
        let t0 = Instant::now();
        let mut scene: Scene<String, f64> = Scene::default();
        scene.reconcile(
            entries(&[("a", 1.0), ("a", 9.0)]),
            t0,
            &Choreography::instant(),
        );
        assert_eq!(scene.logical_keys().len(), 1);
        assert_eq!(scene.sample(&"a".to_string(), t0).unwrap().0, 1.0);
    }

    #[test]
    fn test_logical_keys_follow_target_order_without_repeats() {
        let t0 = Instant::now();
        let mut scene: Scene<String, f64> = Scene::default();
        scene.reconcile(
            entries(&[("b", 1.0), ("a", 2.0)]),
            t0,
            &Choreography::instant(),
        );
        scene.reconcile(
            entries(&[("c", 3.0), ("a", 4.0), ("c", 5.0), ("b", 6.0), ("a", 7.0)]),
            t0,
            &Choreography::instant(),
        );
        assert_eq!(
            scene.logical_keys(),
            &["c".to_string(), "a".to_string(), "b".to_string()]
        );
    }
}
