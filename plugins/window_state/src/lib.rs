//! Window State for Settings Store
//!
//! Saves and restores a window's position, size and top-most flag through a
//! [`DataStore`]. The store itself knows nothing about windows; the host
//! supplies the current geometry and a [`Screen`] that reports the working
//! area of the primary display.
//!
//! # Features
//!
//! - Positions are only saved when they leave a 40 px margin to the screen edge
//! - Saved positions that would put the window off-screen are ignored on load
//! - Loaded sizes are clamped to a caller-supplied minimum
//! - Everything lives in the store's default group under keys derived from a name
//!
//! # Example
//!
//! ```no_run
//! use settings_store::StoreOptions;
//! use settings_window_state::{FixedScreen, Placement, Point, Size, WindowStateExt};
//!
//! let screen = FixedScreen(Size::new(1920, 1080));
//! let mut store = StoreOptions::new("Notepad Settings.xml").open();
//!
//! // On close
//! store.save_form_location("MainForm", Point::new(120, 80), &screen);
//! store.save_form_size("MainForm", Size::new(800, 600));
//!
//! // On startup
//! let size = store.load_form_size("MainForm", Size::new(640, 480), Size::new(320, 240));
//! match store.load_form_location("MainForm", size, &screen) {
//!     Placement::At(point) => println!("open at {},{}", point.x, point.y),
//!     Placement::CenterScreen => println!("open centered"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use settings_store::DataStore;

/// Minimum distance, in pixels, a saved position must keep from the
/// right and bottom edges of the working area.
pub const SCREEN_MARGIN: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum of `self` and `minimum`.
    pub fn at_least(self, minimum: Size) -> Self {
        Self {
            width: self.width.max(minimum.width),
            height: self.height.max(minimum.height),
        }
    }
}

/// Provides the working area of the primary display.
pub trait Screen {
    fn working_area(&self) -> Size;
}

/// A screen with a fixed working area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedScreen(pub Size);

impl Screen for FixedScreen {
    fn working_area(&self) -> Size {
        self.0
    }
}

/// Where a restored window should appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    At(Point),
    #[default]
    CenterScreen,
}

/// Everything restored for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub size: Size,
    pub placement: Placement,
    pub top_most: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            size: Size::new(800, 600),
            placement: Placement::CenterScreen,
            top_most: false,
        }
    }
}

const POSITION_X: &str = "FormPositionX";
const POSITION_Y: &str = "FormPositionY";
const WIDTH: &str = "FormWidth";
const HEIGHT: &str = "FormHeight";
const TOP_MOST: &str = "FormTopMost";

fn key(name: &str, suffix: &str) -> String {
    format!("{}_{}", name, suffix)
}

/// Whether `location` is far enough inside `area` to be worth remembering.
pub fn is_savable(location: Point, area: Size) -> bool {
    let inside = |coord: i32, limit: i32| {
        coord > 0 && i64::from(coord) + i64::from(SCREEN_MARGIN) <= i64::from(limit)
    };
    inside(location.x, area.width) && inside(location.y, area.height)
}

/// Whether a window of `size` at `location` would be usable inside `area`.
///
/// Sums are taken in `i64` so coordinates read back from a file cannot overflow.
pub fn is_restorable(location: Point, size: Size, area: Size) -> bool {
    let fits = |coord: i32, extent: i32, limit: i32| {
        let (coord, limit) = (i64::from(coord), i64::from(limit));
        coord >= 0
            && coord + i64::from(SCREEN_MARGIN) <= limit
            && coord + i64::from(extent) <= limit
    };
    fits(location.x, size.width, area.width) && fits(location.y, size.height, area.height)
}

/// Window geometry helpers for [`DataStore`].
///
/// Each window is identified by a `name`; its values are stored in the
/// store's default group as `<name>_FormPositionX`, `<name>_FormPositionY`,
/// `<name>_FormWidth`, `<name>_FormHeight` and `<name>_FormTopMost`.
pub trait WindowStateExt {
    /// Remember `location` if it lies well inside the screen. Returns whether it was saved.
    fn save_form_location(&mut self, name: &str, location: Point, screen: &dyn Screen) -> bool;

    /// Restore a saved location for a window of `size`, or center it when
    /// nothing usable was saved.
    fn load_form_location(&self, name: &str, size: Size, screen: &dyn Screen) -> Placement;

    fn save_form_size(&mut self, name: &str, size: Size);

    /// Restore a saved size, never smaller than `minimum`.
    fn load_form_size(&self, name: &str, default: Size, minimum: Size) -> Size;

    fn save_form_top_most(&mut self, name: &str, top_most: bool);

    fn load_form_top_most(&self, name: &str, default: bool) -> bool;

    /// Save size, location and top-most flag, writing the file once.
    fn save_window_state(
        &mut self,
        name: &str,
        location: Point,
        size: Size,
        top_most: bool,
        screen: &dyn Screen,
    );

    /// Restore size first, then a location that fits the restored size.
    fn load_window_state(
        &self,
        name: &str,
        default: WindowState,
        minimum: Size,
        screen: &dyn Screen,
    ) -> WindowState;
}

impl WindowStateExt for DataStore {
    fn save_form_location(&mut self, name: &str, location: Point, screen: &dyn Screen) -> bool {
        let area = screen.working_area();
        if !is_savable(location, area) {
            self.log_sink().info(&format!(
                "not saving location {},{} of {} outside {}x{}",
                location.x, location.y, name, area.width, area.height
            ));
            return false;
        }

        self.batch(|store| {
            store.put(&key(name, POSITION_X), &location.x);
            store.put(&key(name, POSITION_Y), &location.y);
        });
        true
    }

    fn load_form_location(&self, name: &str, size: Size, screen: &dyn Screen) -> Placement {
        let group = self.default_group();
        let read = |suffix: &str| {
            self.try_get::<i32>(group, &key(name, suffix), None)
                .ok()
                .flatten()
        };

        let (Some(x), Some(y)) = (read(POSITION_X), read(POSITION_Y)) else {
            return Placement::CenterScreen;
        };

        let location = Point::new(x, y);
        if is_restorable(location, size, screen.working_area()) {
            Placement::At(location)
        } else {
            Placement::CenterScreen
        }
    }

    fn save_form_size(&mut self, name: &str, size: Size) {
        self.batch(|store| {
            store.put(&key(name, WIDTH), &size.width);
            store.put(&key(name, HEIGHT), &size.height);
        });
    }

    fn load_form_size(&self, name: &str, default: Size, minimum: Size) -> Size {
        Size::new(
            self.fetch(&key(name, WIDTH), default.width),
            self.fetch(&key(name, HEIGHT), default.height),
        )
        .at_least(minimum)
    }

    fn save_form_top_most(&mut self, name: &str, top_most: bool) {
        self.put(&key(name, TOP_MOST), &top_most);
    }

    fn load_form_top_most(&self, name: &str, default: bool) -> bool {
        self.fetch(&key(name, TOP_MOST), default)
    }

    fn save_window_state(
        &mut self,
        name: &str,
        location: Point,
        size: Size,
        top_most: bool,
        screen: &dyn Screen,
    ) {
        self.batch(|store| {
            store.save_form_size(name, size);
            store.save_form_location(name, location, screen);
            store.save_form_top_most(name, top_most);
        });
    }

    fn load_window_state(
        &self,
        name: &str,
        default: WindowState,
        minimum: Size,
        screen: &dyn Screen,
    ) -> WindowState {
        let size = self.load_form_size(name, default.size, minimum);
        WindowState {
            size,
            placement: self.load_form_location(name, size, screen),
            top_most: self.load_form_top_most(name, default.top_most),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settings_store::{MemorySink, StoreOptions};
    use std::path::PathBuf;

    const FULL_HD: FixedScreen = FixedScreen(Size::new(1920, 1080));

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Window Settings.xml");
        (dir, path)
    }

    fn stored_location(store: &mut DataStore, x: i32, y: i32) {
        store.put("Main_FormPositionX", &x);
        store.put("Main_FormPositionY", &y);
    }

    #[test]
    fn saves_a_well_placed_location() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path.clone()).open();

        assert!(store.save_form_location("Main", Point::new(100, 100), &FULL_HD));

        let reopened = StoreOptions::new(path).open();
        assert_eq!(reopened.fetch("Main_FormPositionX", 0i32), 100);
        assert_eq!(reopened.fetch("Main_FormPositionY", 0i32), 100);
        assert_eq!(
            reopened.load_form_location("Main", Size::new(800, 600), &FULL_HD),
            Placement::At(Point::new(100, 100))
        );
    }

    #[test]
    fn does_not_save_edge_or_negative_locations() {
        let (_dir, path) = scratch();
        let sink = MemorySink::new();
        let mut store = StoreOptions::new(path).log_sink(sink.clone()).open();

        assert!(!store.save_form_location("Main", Point::new(0, 100), &FULL_HD));
        assert!(!store.save_form_location("Main", Point::new(-10, 100), &FULL_HD));
        assert!(!store.save_form_location("Main", Point::new(1890, 100), &FULL_HD));
        assert!(!store.save_form_location("Main", Point::new(100, 1050), &FULL_HD));
        assert!(store.save_form_location("Main", Point::new(1880, 1040), &FULL_HD));

        assert_eq!(store.fetch("Main_FormPositionX", 0i32), 1880);
        assert_eq!(sink.records().len(), 4);
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn rejects_a_window_that_would_overflow_the_screen() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();
        stored_location(&mut store, 100, 100);

        assert_eq!(
            store.load_form_location("Main", Size::new(2000, 200), &FULL_HD),
            Placement::CenterScreen
        );
    }

    #[test]
    fn rejects_negative_coordinates() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();
        stored_location(&mut store, -5, 50);

        assert_eq!(
            store.load_form_location("Main", Size::new(10, 10), &FULL_HD),
            Placement::CenterScreen
        );
    }

    #[test]
    fn rejects_coordinates_inside_the_margin() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();
        stored_location(&mut store, 1890, 50);

        assert_eq!(
            store.load_form_location("Main", Size::new(10, 10), &FULL_HD),
            Placement::CenterScreen
        );
    }

    #[test]
    fn extreme_stored_coordinates_center_the_window() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();

        stored_location(&mut store, i32::MAX, 50);
        assert_eq!(
            store.load_form_location("Main", Size::new(10, 10), &FULL_HD),
            Placement::CenterScreen
        );

        stored_location(&mut store, 50, i32::MAX - 10);
        assert_eq!(
            store.load_form_location("Main", Size::new(10, 10), &FULL_HD),
            Placement::CenterScreen
        );

        stored_location(&mut store, 100, 100);
        assert_eq!(
            store.load_form_location("Main", Size::new(i32::MAX, i32::MAX), &FULL_HD),
            Placement::CenterScreen
        );

        stored_location(&mut store, i32::MIN, i32::MIN);
        assert_eq!(
            store.load_form_location("Main", Size::new(10, 10), &FULL_HD),
            Placement::CenterScreen
        );
    }

    #[test]
    fn extreme_locations_are_not_saved() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();

        assert!(!store.save_form_location("Main", Point::new(i32::MAX - 10, 10), &FULL_HD));
        assert!(!store.save_form_location("Main", Point::new(10, i32::MAX), &FULL_HD));
        assert!(!store.contains(store.default_group(), "Main_FormPositionX"));

        let huge = FixedScreen(Size::new(i32::MAX, i32::MAX));
        assert!(!store.save_form_location("Main", Point::new(i32::MAX - 10, 10), &huge));
        assert!(store.save_form_location("Main", Point::new(i32::MAX - 40, 10), &huge));
    }

    #[test]
    fn missing_location_centers() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();
        store.put("Main_FormPositionX", &100i32);

        assert_eq!(
            store.load_form_location("Main", Size::new(10, 10), &FULL_HD),
            Placement::CenterScreen
        );
    }

    #[test]
    fn size_is_clamped_to_the_minimum() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();
        let minimum = Size::new(320, 240);

        assert_eq!(
            store.load_form_size("Main", Size::new(640, 480), minimum),
            Size::new(640, 480)
        );

        store.save_form_size("Main", Size::new(100, 900));
        assert_eq!(
            store.load_form_size("Main", Size::new(640, 480), minimum),
            Size::new(320, 900)
        );
    }

    #[test]
    fn top_most_round_trips() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();

        assert!(!store.load_form_top_most("Main", false));
        store.save_form_top_most("Main", true);
        assert!(store.load_form_top_most("Main", false));
    }

    #[test]
    fn window_state_uses_the_default_group() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path.clone())
            .default_group("Windows")
            .open();

        store.save_window_state("Main", Point::new(200, 150), Size::new(1024, 768), true, &FULL_HD);

        let reopened = StoreOptions::new(path).default_group("Windows").open();
        assert_eq!(
            reopened.keys("Windows"),
            vec![
                "Main_FormWidth".to_string(),
                "Main_FormHeight".to_string(),
                "Main_FormPositionX".to_string(),
                "Main_FormPositionY".to_string(),
                "Main_FormTopMost".to_string(),
            ]
        );
        assert_eq!(
            reopened.load_window_state("Main", WindowState::default(), Size::new(320, 240), &FULL_HD),
            WindowState {
                size: Size::new(1024, 768),
                placement: Placement::At(Point::new(200, 150)),
                top_most: true,
            }
        );
    }

    #[test]
    fn restored_location_is_checked_against_the_restored_size() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();
        store.save_window_state("Main", Point::new(1200, 100), Size::new(600, 400), false, &FULL_HD);

        let state = store.load_window_state(
            "Main",
            WindowState::default(),
            Size::new(800, 300),
            &FULL_HD,
        );

        assert_eq!(state.size, Size::new(800, 400));
        assert_eq!(state.placement, Placement::CenterScreen);
    }

    #[test]
    fn sizes_can_be_stored_as_structured_values() {
        let (_dir, path) = scratch();
        let mut store = StoreOptions::new(path).open();
        store.registry_mut().register_structured::<Size>();

        store.set("Layout", "SplitterPanel", &Size::new(300, 720));

        assert_eq!(
            store.get("Layout", "SplitterPanel", Size::default()),
            Size::new(300, 720)
        );
    }
}
