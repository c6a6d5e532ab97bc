//! Screen navigation for button and touch devices.

use std::time::Duration;

use maya_containers::DeviceModel;

use crate::api::Button;
use crate::consts::HOLD_DURATION;

/// How the final approval of a flow is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApproveAction {
    /// Both buttons on the approve screen, only choice on button devices
    #[default]
    BothClick,
    /// Tap the confirm button, e.g. showing an address on a touch device
    ApproveTapButton,
    /// Keep the finger on the confirm button, signing on a touch device
    ApproveHoldButton,
}

/// Tap coordinates of the elements used by the scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchLayout {
    pub next: (u16, u16),
    pub previous: (u16, u16),
    pub confirm: (u16, u16),
    pub hold: (u16, u16),
    pub reject: (u16, u16),
    pub settings: (u16, u16),
    pub expert_toggle: (u16, u16),
    pub exit_settings: (u16, u16),
}

const STAX_LAYOUT: TouchLayout = TouchLayout {
    next: (385, 615),
    previous: (300, 615),
    confirm: (200, 515),
    hold: (335, 515),
    reject: (36, 615),
    settings: (362, 45),
    expert_toggle: (350, 115),
    exit_settings: (36, 45),
};

const FLEX_LAYOUT: TouchLayout = TouchLayout {
    next: (405, 540),
    previous: (320, 540),
    confirm: (240, 440),
    hold: (405, 440),
    reject: (55, 540),
    settings: (415, 75),
    expert_toggle: (390, 140),
    exit_settings: (55, 75),
};

/// Layout of a touch model, `None` for button devices
pub fn touch_layout(model: &DeviceModel) -> Option<&'static TouchLayout> {
    match model.name() {
        "stax" => Some(&STAX_LAYOUT),
        "flex" => Some(&FLEX_LAYOUT),
        _ => None,
    }
}

/// A single interaction with the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavStep {
    Press(Button),
    Touch { x: u16, y: u16, hold: Duration },
}

impl NavStep {
    fn tap((x, y): (u16, u16)) -> Self {
        NavStep::Touch {
            x,
            y,
            hold: Duration::ZERO,
        }
    }

    /// Step moving to the next screen of a review flow
    pub fn next(model: &DeviceModel) -> Self {
        match touch_layout(model) {
            Some(layout) => Self::tap(layout.next),
            None => NavStep::Press(Button::Right),
        }
    }

    /// Step giving the approval once the approve screen is shown
    pub fn approve(model: &DeviceModel, action: ApproveAction) -> Self {
        match (touch_layout(model), action) {
            (None, _) | (Some(_), ApproveAction::BothClick) => NavStep::Press(Button::Both),
            (Some(layout), ApproveAction::ApproveTapButton) => Self::tap(layout.confirm),
            (Some(layout), ApproveAction::ApproveHoldButton) => {
                let (x, y) = layout.hold;
                NavStep::Touch {
                    x,
                    y,
                    hold: HOLD_DURATION,
                }
            }
        }
    }

    /// Steps refusing the request once the reject screen is shown, touch
    /// devices ask to confirm the rejection
    pub fn reject(model: &DeviceModel) -> Vec<Self> {
        match touch_layout(model) {
            Some(layout) => vec![Self::tap(layout.reject), Self::tap(layout.confirm)],
            None => vec![NavStep::Press(Button::Both)],
        }
    }
}

/// Expand a main menu schedule into single steps.
///
/// `n > 0` moves right `n` times, `n < 0` moves left `-n` times and `0`
/// confirms the current item. Touch devices map right and left to the page
/// arrows and confirm to the settings button.
pub fn schedule_steps(model: &DeviceModel, schedule: &[i32]) -> Vec<NavStep> {
    let layout = touch_layout(model);
    let mut steps = vec![];
    for &n in schedule {
        let (step, count) = match (layout, n) {
            (None, 0) => (NavStep::Press(Button::Both), 1),
            (None, n) if n > 0 => (NavStep::Press(Button::Right), n),
            (None, n) => (NavStep::Press(Button::Left), -n),
            (Some(l), 0) => (NavStep::tap(l.settings), 1),
            (Some(l), n) if n > 0 => (NavStep::tap(l.next), n),
            (Some(l), n) => (NavStep::tap(l.previous), -n),
        };
        steps.extend(std::iter::repeat(step).take(count as usize));
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use maya_containers::{FLEX, NANOS, NANOX, STAX};

    #[test]
    fn nano_schedule() {
        let steps = schedule_steps(&NANOS, &[1, 0, 0, 4, -5]);
        assert_eq!(steps.len(), 12);
        assert_eq!(steps[0], NavStep::Press(Button::Right));
        assert_eq!(steps[1], NavStep::Press(Button::Both));
        assert_eq!(steps[2], NavStep::Press(Button::Both));
        assert!(steps[3..7].iter().all(|s| *s == NavStep::Press(Button::Right)));
        assert!(steps[7..].iter().all(|s| *s == NavStep::Press(Button::Left)));
    }

    #[test]
    fn touch_schedule() {
        let steps = schedule_steps(&STAX, &[2, 0, -1]);
        assert_eq!(
            steps,
            [
                NavStep::tap(STAX_LAYOUT.next),
                NavStep::tap(STAX_LAYOUT.next),
                NavStep::tap(STAX_LAYOUT.settings),
                NavStep::tap(STAX_LAYOUT.previous),
            ]
        );
    }

    #[test]
    fn approve_steps() {
        assert_eq!(
            NavStep::approve(&NANOX, ApproveAction::ApproveHoldButton),
            NavStep::Press(Button::Both)
        );
        assert_eq!(
            NavStep::approve(&FLEX, ApproveAction::ApproveTapButton),
            NavStep::tap(FLEX_LAYOUT.confirm)
        );
        assert!(matches!(
            NavStep::approve(&STAX, ApproveAction::ApproveHoldButton),
            NavStep::Touch { hold, .. } if hold == HOLD_DURATION
        ));
        assert_eq!(NavStep::next(&NANOS), NavStep::Press(Button::Right));
        assert_eq!(
            NavStep::reject(&FLEX),
            [
                NavStep::tap(FLEX_LAYOUT.reject),
                NavStep::tap(FLEX_LAYOUT.confirm)
            ]
        );
        assert_eq!(NavStep::reject(&NANOX), [NavStep::Press(Button::Both)]);
        assert!(touch_layout(&NANOS).is_none());
    }
}
