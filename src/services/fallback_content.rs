//! Offline content generation
//!
//! Produces every content section of a plan from the trip prompt alone, for use
//! whenever the AI provider is unavailable or returns something unusable.
//! Everything here is a pure function of its inputs: the same prompt, preferences
//! and companion always yield the same content.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::plan::{
    Batch1Content, Batch2Content, Batch3Content, Coordinates, DayActivities, DayPlan,
    ItineraryItem, TopPlace, MAX_TRIP_DAYS,
};

const DEFAULT_DAYS: u32 = 3;
const DEFAULT_LOCATION: &str = "your destination";
const TOP_PLACE_COUNT: usize = 5;
const TOP_PLACE_LAT_STEP: f64 = 0.018;
const TOP_PLACE_LNG_STEP: f64 = 0.022;

static DAYS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*day").expect("valid day pattern"));
static TRIP_TO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)trip to").expect("valid destination pattern"));

static COASTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"goa|kerala|thailand|phuket|maldives|bali").expect("valid coastal pattern")
});
static MOUNTAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"shimla|manali|himachal|mountain|hill").expect("valid mountain pattern")
});
static DESERT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dubai|abu dhabi|desert").expect("valid desert pattern"));
static TROPICAL_CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"singapore|kuala lumpur|tropical").expect("valid tropical pattern")
});
static EUROPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"europe|paris|london|rome|barcelona").expect("valid europe pattern")
});

const CURATED_COORDINATES: &[(&str, f64, f64)] = &[
    ("bengaluru", 12.9716, 77.5946),
    ("bangalore", 12.9716, 77.5946),
    ("bengaluru, karnataka, india", 12.9716, 77.5946),
    ("bangalore, karnataka, india", 12.9716, 77.5946),
    ("paris", 48.8566, 2.3522),
    ("paris, france", 48.8566, 2.3522),
    ("london", 51.5072, -0.1276),
    ("london, united kingdom", 51.5072, -0.1276),
    ("new york", 40.7128, -74.006),
    ("new york city", 40.7128, -74.006),
    ("new york, usa", 40.7128, -74.006),
    ("los angeles", 34.0522, -118.2437),
    ("san francisco", 37.7749, -122.4194),
    ("dubai", 25.2048, 55.2708),
    ("singapore", 1.3521, 103.8198),
    ("tokyo", 35.6764, 139.6501),
    ("sydney", -33.8688, 151.2093),
    ("bali", -8.3405, 115.092),
    ("rome", 41.9028, 12.4964),
    ("barcelona", 41.3851, 2.1734),
    ("new delhi", 28.6139, 77.209),
    ("delhi", 28.6139, 77.209),
    ("jaipur", 26.9124, 75.7873),
    ("goa", 15.2993, 74.124),
    ("kerala", 10.8505, 76.2711),
    ("mumbai", 19.076, 72.8777),
    ("pune", 18.5204, 73.8567),
    ("chennai", 13.0827, 80.2707),
    ("hyderabad", 17.385, 78.4867),
    ("kolkata", 22.5726, 88.3639),
    ("manali", 32.2432, 77.1892),
    ("shimla", 31.1048, 77.1734),
    ("phuket", 7.9519, 98.3381),
    ("maldives", 3.2028, 73.2207),
    ("thailand", 15.87, 100.9925),
];

const TOP_PLACE_SUFFIXES: [&str; 6] = [
    "Heritage Quarter",
    "Riverside Promenade",
    "Creative Arts District",
    "Night Market",
    "Sunset Point",
    "Botanical Escape",
];

const MORNING_TEMPLATES: [&str; 3] = [
    "Ease into the day with a relaxed walk across {place} lanes and a specialty coffee stop.",
    "Start with a sunrise viewpoint near {place} for soft light and city panoramas.",
    "Join a local expert for an orientation walk that unlocks insider stories about {place}.",
];

const AFTERNOON_TEMPLATES: [&str; 3] = [
    "Head indoors for a hands-on workshop showcasing crafts and culinary secrets rooted in {place}.",
    "Spend the afternoon tracing landmark highlights around {place} with plenty of photo pauses.",
    "Break for a long lunch followed by museum hopping to understand how {place} evolved.",
];

const EVENING_TEMPLATES: [&str; 3] = [
    "Wind down at a rooftop or riverside lounge watching {place} light up after dark.",
    "Reserve a chef-led tasting dinner that celebrates the signature flavours of {place}.",
    "Join a storytelling night walk to see how {place} transforms in the evening.",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TripDetails {
    pub location: String,
    pub days: u32,
    pub activity_preferences: Vec<String>,
    pub companion: Option<String>,
}

/// Pulls the day count and destination out of free text such as
/// "5 day trip to Paris, France".
pub fn extract_trip_details(
    prompt_text: &str,
    activity_preferences: &[String],
    companion: Option<&str>,
) -> TripDetails {
    let days = DAYS_PATTERN
        .captures(prompt_text)
        .and_then(|captures| captures.get(1))
        .map(|digits| {
            digits
                .as_str()
                .parse::<u32>()
                .map_or(MAX_TRIP_DAYS, |days| days.clamp(1, MAX_TRIP_DAYS))
        })
        .unwrap_or(DEFAULT_DAYS);

    let location = TRIP_TO_PATTERN
        .split(prompt_text)
        .nth(1)
        .map(|rest| rest.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    TripDetails {
        location,
        days,
        activity_preferences: activity_preferences.to_vec(),
        companion: companion.map(str::to_string),
    }
}

pub fn theme_descriptor(preferences: &[String]) -> &'static str {
    let Some(first) = preferences.first() else {
        return "balanced mix of culture, food, and easy adventures";
    };

    match first.to_lowercase().as_str() {
        "adventure" | "adventurous" => "a healthy dose of light adventure and time outdoors",
        "culturalexperiences" | "culture" => {
            "immersive cultural touchpoints, creative workshops, and local traditions"
        }
        "historical" => "historic walks, heritage sites, and thoughtful storytelling",
        "relaxationwellness" => "slow travel moments, mindful pauses, and wellness-friendly stops",
        "shopping" => "market strolls, indie boutiques, and thoughtful souvenir stops",
        "nightlife" => "great dining, relaxed lounges, and after-dark energy",
        _ => "landmark highlights mixed with neighborhood discoveries",
    }
}

pub fn companion_note(companion: Option<&str>) -> Option<String> {
    let normalized = companion?.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let note = match normalized.as_str() {
        "solo" => "and workable for solo explorers".to_string(),
        "couple" => "with a relaxed pace for couples".to_string(),
        "family" => "with flexible options that families appreciate".to_string(),
        "group" => "and group-friendly throughout".to_string(),
        other => format!("with your {}", other),
    };
    Some(note)
}

pub fn seasonal_window(location: &str) -> &'static str {
    if location.is_empty() {
        return "Plan between late October and early March for comfortable temperatures and lighter crowds.";
    }

    let normalized = location.to_lowercase();

    if COASTAL.is_match(&normalized) {
        "Visit between November and March for sunny skies, mellow seas, and calmer humidity."
    } else if MOUNTAIN.is_match(&normalized) {
        "Late March to June offers mild mountain weather, while October brings crisp skies without peak chill."
    } else if DESERT.is_match(&normalized) {
        "November to March keeps daytime heat manageable and perfect for desert evenings."
    } else if TROPICAL_CITY.is_match(&normalized) {
        "Plan for February to April when rainfall eases and humidity is gentler."
    } else if EUROPE.is_match(&normalized) {
        "Late April through June or September brings soft sunshine and thinner visitor lines."
    } else {
        "Shoulder months between March-May or September-November balance pleasant weather with fewer crowds."
    }
}

/// Base coordinates for a destination: the curated table when the full name or
/// any comma segment is known, a stable hash of the name otherwise.
pub fn coordinates_for(location: &str) -> Coordinates {
    if location.is_empty() {
        return Coordinates { lat: 0.0, lng: 0.0 };
    }

    let normalized = location.trim().to_lowercase();
    let candidates = std::iter::once(normalized.as_str())
        .chain(normalized.split(',').map(str::trim));

    for candidate in candidates {
        if let Some((_, lat, lng)) = CURATED_COORDINATES
            .iter()
            .find(|(name, _, _)| *name == candidate)
        {
            return Coordinates {
                lat: *lat,
                lng: *lng,
            };
        }
    }

    hash_coordinates(&normalized)
}

pub fn hash_coordinates(location: &str) -> Coordinates {
    let normalized = location.trim().to_lowercase();
    let hash: u64 = normalized.encode_utf16().map(u64::from).sum();
    let length = normalized.encode_utf16().count() as f64;

    let lat = ((hash % 120) as f64 - 60.0) + length * 0.3;
    let lng = ((hash % 320) as f64 - 160.0) + length * 0.45;

    Coordinates {
        lat: round4(lat),
        lng: round4(lng),
    }
}

pub fn build_batch1(
    prompt_text: &str,
    activity_preferences: &[String],
    companion: Option<&str>,
) -> Batch1Content {
    let details = extract_trip_details(prompt_text, activity_preferences, companion);
    let theme = theme_descriptor(&details.activity_preferences);
    let note = with_leading_comma(companion_note(details.companion.as_deref()));

    Batch1Content {
        about_the_place: format!(
            "A {}-day journey to {} promises layered experiences: neighbourhood walks, mindful pauses, and pockets of spontaneity. \
Expect welcoming hosts, easy-to-navigate districts, and the perfect balance between headline attractions and community-driven discoveries. \
This itinerary gives you curated anchors while leaving space for the unexpected, making it ideal for travellers who appreciate {}{}.",
            details.days, details.location, theme, note
        ),
        best_time_to_visit: seasonal_window(&details.location).to_string(),
    }
}

pub fn build_batch2(prompt_text: &str, activity_preferences: &[String]) -> Batch2Content {
    let details = extract_trip_details(prompt_text, activity_preferences, None);

    Batch2Content {
        activities_to_do: activity_list(&details.location, activity_preferences),
        local_cuisine: cuisine_list(&details.location),
        packing_checklist: packing_checklist(activity_preferences),
    }
}

pub fn build_batch3(
    prompt_text: &str,
    activity_preferences: &[String],
    companion: Option<&str>,
) -> Batch3Content {
    let details = extract_trip_details(prompt_text, activity_preferences, companion);

    Batch3Content {
        itinerary: build_itinerary(&details),
        top_places_to_visit: top_places(&details.location),
    }
}

pub fn activity_list(location: &str, preferences: &[String]) -> Vec<String> {
    let focus = preferences
        .first()
        .map(|preference| preference.to_lowercase())
        .unwrap_or_else(|| "sightseeing".to_string());
    let target = if location.is_empty() { "the city" } else { location };
    let place = first_segment(target);

    let mut activities = vec![
        format!("Sunrise walk at {} Viewpoint to get a first panoramic impression of the region.", place),
        format!("Guided neighborhood hop through {} backstreets to discover street art and hidden cafés.", place),
        format!("Cycling loop around iconic landmarks of {} with plenty of photo stops.", place),
        format!("Evening food crawl across {} markets to sample signature bites and desserts.", place),
        format!("Half-day getaway to a scenic spot just outside {} for fresh air and slow moments.", place),
    ];

    if focus.contains("adventure") {
        activities.push(format!(
            "Try a guided adventure session near {} such as hiking, canyoning, or easy rappelling.",
            place
        ));
    }
    if focus.contains("culture") || focus.contains("histor") {
        activities.push(format!(
            "Book a local storytelling walk through {} museums and heritage quarters.",
            place
        ));
    }
    if focus.contains("relax") {
        activities.push(format!(
            "Reserve a wellness block with spa or yoga options available across premium stays in {}.",
            place
        ));
    }

    activities
}

pub fn cuisine_list(location: &str) -> Vec<String> {
    let place = non_empty_or(first_segment(location), "the city");

    vec![
        format!("Breakfast at a classic {} café for regional breads, filter coffee, and local morning staples.", place),
        format!("Seasonal tasting thali featuring heirloom recipes popular across {} households.", place),
        format!("Street food crawl pairing iconic snacks from different neighborhoods within {}.", place),
        format!("Dinner reservation at a chef-led kitchen reimagining {} classics with seasonal ingredients.", place),
        format!("Dessert stop for traditional sweets and artisanal gelato inspired by {} flavours.", place),
    ]
}

pub fn packing_checklist(preferences: &[String]) -> Vec<String> {
    let mut items: Vec<String> = [
        "Lightweight daypack with rain cover",
        "Versatile footwear that works for walks and casual dinners",
        "Reusable water bottle and hydration sachets",
        "Power bank and multi-plug travel adapter",
        "Travel-size first aid kit with motion relief",
    ]
    .iter()
    .map(|item| item.to_string())
    .collect();

    let normalized: Vec<String> = preferences.iter().map(|p| p.to_lowercase()).collect();
    let any = |needle: &str| normalized.iter().any(|p| p.contains(needle));

    if any("adventure") {
        items.push("Quick-dry layers and compact towel for outdoor segments".to_string());
        items.push("Action camera or phone harness for hands-free filming".to_string());
    }
    if any("relax") {
        items.push("Comfortable lounge wear for downtime at stays".to_string());
    }
    if any("night") {
        items.push("Dressy smart-casual outfit for evenings out".to_string());
    }
    if any("culture") || any("histor") {
        items.push("Notebook or digital pen for museum and gallery notes".to_string());
    }

    items
}

pub fn build_itinerary(details: &TripDetails) -> Vec<DayPlan> {
    let place = first_segment(&details.location);
    let preferences = &details.activity_preferences;
    let companion = details.companion.as_deref();

    (0..details.days as usize)
        .map(|day_index| {
            let template = day_index % 3;
            let morning = MORNING_TEMPLATES[template].replace("{place}", place);
            let afternoon = AFTERNOON_TEMPLATES[template].replace("{place}", place);
            let evening = EVENING_TEMPLATES[template].replace("{place}", place);

            DayPlan {
                title: format!("Day {}", day_index + 1),
                activities: DayActivities {
                    morning: vec![ItineraryItem {
                        brief_description: with_theme_notes(
                            &format!("{} Expect a gentle pace with plenty of time for photos and café breaks.", morning),
                            preferences,
                            companion,
                        ),
                        itinerary_item: morning,
                    }],
                    afternoon: vec![ItineraryItem {
                        brief_description: with_theme_notes(
                            &format!("{} Keep the schedule flexible so you can follow recommendations from locals you meet along the way.", afternoon),
                            preferences,
                            companion,
                        ),
                        itinerary_item: afternoon,
                    }],
                    evening: vec![ItineraryItem {
                        brief_description: with_theme_notes(
                            &format!("{} Wrap up with a slow walk back to your stay or extend the night with live music if you are up for it.", evening),
                            preferences,
                            companion,
                        ),
                        itinerary_item: evening,
                    }],
                },
            }
        })
        .collect()
}

pub fn top_places(location: &str) -> Vec<TopPlace> {
    let base = non_empty_or(first_segment(location), "Destination");
    let origin = coordinates_for(location);

    TOP_PLACE_SUFFIXES
        .iter()
        .take(TOP_PLACE_COUNT)
        .enumerate()
        .map(|(index, suffix)| TopPlace {
            name: format!("{} {}", base, suffix),
            coordinates: Coordinates {
                lat: round4(origin.lat + index as f64 * TOP_PLACE_LAT_STEP),
                lng: round4(origin.lng + index as f64 * TOP_PLACE_LNG_STEP),
            },
        })
        .collect()
}

fn with_theme_notes(base: &str, preferences: &[String], companion: Option<&str>) -> String {
    format!(
        "{} This plan leans into {}{}.",
        base,
        theme_descriptor(preferences),
        with_leading_comma(companion_note(companion))
    )
}

fn with_leading_comma(note: Option<String>) -> String {
    note.map(|note| format!(", {}", note)).unwrap_or_default()
}

fn first_segment(location: &str) -> &str {
    location.split(',').next().unwrap_or(location)
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
