#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Welcome,
    Summary,
    Explore,
}

/// Page for this cycle given the buttons pressed in it. Pressing both moves
/// away from the page that was active.
pub fn next_page(current: Page, summary_pressed: bool, explore_pressed: bool) -> Page {
    match (summary_pressed, explore_pressed) {
        (false, false) => match current {
            Page::Welcome => Page::Summary,
            other => other,
        },
        (true, false) => Page::Summary,
        (false, true) => Page::Explore,
        (true, true) => match current {
            Page::Summary => Page::Explore,
            Page::Explore | Page::Welcome => Page::Summary,
        },
    }
}
