//! Fixture payloads used when mock mode is on (`--mock` / `HUD_USE_MOCKS`)

use homelab_hud_types::{into_slide_data, SlideData};
use serde_json::{json, Value};

pub fn pihole() -> SlideData {
    into_slide_data(json!({
        "domains_being_blocked": 100000,
        "dns_queries_today": 50000,
        "ads_blocked_today": 5000,
        "ads_percentage_today": 10.0,
        "unique_clients": 10,
        "status": "enabled",
        "top_clients": [],
        "top_blocked": []
    }))
}

/// Raw `/status/sessions` response with one stream playing
pub fn plex_sessions() -> Value {
    json!({
        "MediaContainer": {
            "size": 1,
            "Metadata": [{
                "type": "episode",
                "title": "The Pilot",
                "grandparentTitle": "Example Show",
                "viewOffset": 754000,
                "duration": 2580000,
                "User": {"title": "demo"},
                "Player": {"state": "playing"}
            }]
        }
    })
}

/// Raw ARM joblist with one active rip
pub fn arm_joblist() -> Value {
    json!({
        "success": true,
        "results": {
            "0": {
                "job_id": 42,
                "status": "active",
                "title": "Mock Title",
                "disctype": "bluray",
                "video_type": "movie",
                "start_time": "2024-01-15 20:31:02",
                "no_of_titles": "12",
                "year": "1999",
                "pid": "4242",
                "stage": "ripping",
                "label": "MOCK_DISC",
                "mountpoint": "/mnt/dev/sr0"
            }
        }
    })
}

pub fn octoprint() -> SlideData {
    into_slide_data(json!({
        "is_printing": true,
        "state": "printing",
        "filename": "test_print.gcode",
        "progress": 45.5,
        "print_time": 1234,
        "print_time_left": 1500,
        "tool0_actual": 210.5,
        "tool0_target": 215.0,
        "bed_actual": 60.0,
        "bed_target": 60.0
    }))
}

pub fn weather() -> SlideData {
    into_slide_data(json!({
        "current": {
            "temp_c": 22.5,
            "condition": "Partly Cloudy",
            "humidity": 65,
            "wind_kph": 12.3,
            "feelslike_c": 23.0
        },
        "forecast": [
            {"date": "2024-01-15", "maxtemp_c": 24.0, "mintemp_c": 18.0, "condition": "Clear", "daily_chance_of_rain": 10},
            {"date": "2024-01-16", "maxtemp_c": 26.0, "mintemp_c": 20.0, "condition": "Sunny", "daily_chance_of_rain": 0},
            {"date": "2024-01-17", "maxtemp_c": 23.0, "mintemp_c": 17.0, "condition": "Cloudy", "daily_chance_of_rain": 60}
        ]
    }))
}
