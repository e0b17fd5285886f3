use std::collections::HashMap;

use crate::error::{Error, Result};

/// Predefined gestures, by name.
///
/// Each step is evaluated against one group of simultaneous tracks. Rule calls inside a
/// step can be combined with `+`, `*` and `||`; `&&` moves on to the next simultaneous
/// track of the same step.
const LIBRARY: &[(&str, &[&str])] = &[
    ("tap", &["tap()"]),
    ("twoTap", &["tap()", "tap()"]),
    ("longTap", &["longTap()"]),
    ("twoTapLong", &["tap()", "longTap()"]),
    ("doubleTap", &["tap() && tap()"]),
    ("doubleLongTap", &["longTap() && longTap()"]),
    ("twoDoubleTap", &["tap() && tap()", "tap() && tap()"]),
    ("swipeLeft", &["line(0)"]),
    ("swipeRight", &["line(180)"]),
    ("swipeUp", &["line(90)"]),
    ("swipeDown", &["line(-90)"]),
    ("doubleSwipeLeft", &["line(0) && line(0)"]),
    ("doubleSwipeRight", &["line(180) && line(180)"]),
    ("doubleSwipeUp", &["line(90) && line(90)"]),
    ("doubleSwipeDown", &["line(-90) && line(-90)"]),
    ("zoomIn", &["pinch(-1) && pinch(-1)"]),
    ("zoomOut", &["pinch(1) && pinch(1)"]),
    (
        "circle",
        &["arc(400,90) * circle() || arc(-400,90) * circle()"],
    ),
    ("circleRight", &["arc(400,90) * circle()"]),
    ("circleLeft", &["arc(-400,90) * circle()"]),
];

pub fn builtin(name: &str) -> Option<Gesture> {
    LIBRARY
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(n, steps)| Gesture {
            name: n.to_string(),
            priority: 0,
            steps: steps.iter().map(|s| s.to_string()).collect(),
        })
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    LIBRARY.iter().map(|(n, _)| *n)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Gesture {
    name: String,
    priority: i32,
    steps: Vec<String>,
}

impl Gesture {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        steps: Vec<S>,
        priority: i32,
    ) -> Result<Self> {
        let name = name.into();
        let steps: Vec<String> = steps.into_iter().map(Into::into).collect();
        if steps.is_empty() {
            return Err(Error::EmptyGesture { name });
        }
        Ok(Self {
            name,
            priority,
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }
}

/// Registry of gestures keyed by name. Re-registering a name replaces the old entry.
#[derive(Clone, Debug, Default)]
pub struct GestureList {
    entries: HashMap<String, (u64, Gesture)>,
    next_seq: u64,
}

impl GestureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut list = Self::new();
        for name in builtin_names() {
            if let Some(gesture) = builtin(name) {
                list.add_gesture(gesture);
            }
        }
        list
    }

    pub fn add<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        steps: Vec<S>,
        priority: i32,
    ) -> Result<()> {
        let gesture = Gesture::new(name, steps, priority)?;
        self.add_gesture(gesture);
        Ok(())
    }

    pub fn add_gesture(&mut self, gesture: Gesture) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(gesture.name.clone(), (seq, gesture));
    }

    pub fn add_all(&mut self, gestures: impl IntoIterator<Item = Gesture>) {
        for gesture in gestures {
            self.add_gesture(gesture);
        }
    }

    /// Registers a comma separated batch. Library names resolve to their predefined
    /// steps; anything else becomes a one-step custom gesture named `gesture{n}` after its
    /// 1-based position in the batch.
    pub fn add_named(&mut self, batch: &str, priority: i32) -> Result<()> {
        for (i, entry) in batch.split(',').map(str::trim).enumerate() {
            if entry.is_empty() {
                continue;
            }
            let gesture = match builtin(entry) {
                Some(mut gesture) => {
                    gesture.priority = priority;
                    gesture
                }
                None => Gesture::new(format!("gesture{}", i + 1), vec![entry], priority)?,
            };
            self.add_gesture(gesture);
        }
        Ok(())
    }

    /// Removing an unknown name is a no-op.
    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&Gesture> {
        self.entries.get(name).map(|(_, g)| g)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ascending priority, ties in registration order.
    pub fn get_sorted(&self) -> Vec<&Gesture> {
        let mut sorted: Vec<&(u64, Gesture)> = self.entries.values().collect();
        sorted.sort_by_key(|(seq, g)| (g.priority, *seq));
        sorted.into_iter().map(|(_, g)| g).collect()
    }
}
