use crate::{
    AudioDevice, Config,
    registry::{next_in_cycle, position, replacement},
};

fn devices() -> Vec<AudioDevice> {
    vec![
        AudioDevice::new("A", "Speakers", false),
        AudioDevice::new("B", "Headset", true),
        AudioDevice::new("C", "HDMI", false),
    ]
}

fn excluding(ids: &[&str]) -> Config {
    Config {
        excluded_device_ids: ids.iter().map(|s| s.to_string()).collect(),
        hotkey: None,
    }
}

/// WHAT: Without a selection, cycling starts after the OS default
/// WHY: First hotkey press should move away from what is playing now
#[test]
fn given_no_selection_when_cycling_then_device_after_default() {
    // Given: B is the OS default, nothing excluded
    let config = excluding(&[]);

    // When: Picking the next device
    let devices = devices();
    let next = next_in_cycle(&devices, &config, None);

    // Then: C
    assert_eq!(next.map(|d| d.id.as_str()), Some("C"));
}

/// WHAT: A vanished selection falls back to the OS default as current
/// WHY: Device ids are not stable across reboots
#[test]
fn given_selection_missing_from_snapshot_when_cycling_then_uses_default() {
    // Given: An active id that is not in the snapshot
    let config = excluding(&[]);

    // When: Picking the next device
    let devices = devices();
    let next = next_in_cycle(&devices, &config, Some("gone"));

    // Then: Continues after the default
    assert_eq!(next.map(|d| d.id.as_str()), Some("C"));
}

/// WHAT: Current device that is excluded restarts the cycle
/// WHY: An excluded OS default has no place in the eligible order
#[test]
fn given_default_excluded_when_cycling_then_first_eligible() {
    // Given: The OS default is excluded
    let config = excluding(&["B"]);

    // When: Picking the next device
    let devices = devices();
    let next = next_in_cycle(&devices, &config, None);

    // Then: The first eligible device
    assert_eq!(next.map(|d| d.id.as_str()), Some("A"));
}

/// WHAT: Replacement prefers the OS default
/// WHY: Falling back to what the OS uses is least surprising
#[test]
fn given_default_eligible_when_replacing_then_default_chosen() {
    // Given: Only A excluded
    let config = excluding(&["A"]);

    // When/Then: B (the default) replaces
    assert_eq!(
        replacement(&devices(), &config).map(|d| d.id.as_str()),
        Some("B")
    );
}

/// WHAT: Badge position counts only eligible devices
/// WHY: The tray number must match what the hotkey cycles through
#[test]
fn given_excluded_device_before_current_when_positioning_then_skipped() {
    // Given: A excluded, C active
    let config = excluding(&["A"]);

    // When: Computing the position
    let pos = position(&devices(), &config, Some("C"));

    // Then: Second among [B, C]
    assert_eq!(pos, Some(2));
}

/// WHAT: Empty snapshot yields nothing
/// WHY: Callers turn this into NoDevices
#[test]
fn given_empty_snapshot_when_selecting_then_none() {
    // Given: No devices
    let config = excluding(&[]);

    // When/Then: Nothing to cycle to, replace with or position
    assert!(next_in_cycle(&[], &config, None).is_none());
    assert!(replacement(&[], &config).is_none());
    assert!(position(&[], &config, None).is_none());
}
