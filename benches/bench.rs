// Criterion benchmarks for TravalPass Match

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use travalpass_match::core::{filter_itineraries, Matcher, dates::calculate_day_window};
use travalpass_match::models::{AgeRange, Itinerary, OrientationPreference, SearchCriteria};
use chrono::{Duration, NaiveDate, Utc};

const DESTINATIONS: &[&str] = &["Miami, FL, USA", "Orlando, FL, USA", "Lisbon, Portugal", "Tokyo, Japan"];
const STATUSES: &[&str] = &["single", "couple", "group"];

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
}

fn create_candidate(id: usize) -> Itinerary {
    let start = base_date() + Duration::days((id % 40) as i64);
    let end = start + Duration::days((id % 9) as i64);

    let mut itinerary = Itinerary::from_dates(
        id.to_string(),
        DESTINATIONS[id % DESTINATIONS.len()],
        start,
        end,
        Utc::now() - Duration::minutes(id as i64),
    );
    itinerary.age = if id % 11 == 0 { None } else { Some(18 + (id % 50) as u8) };
    itinerary.gender = Some(if id % 2 == 0 { "Female" } else { "Male" }.to_string());
    itinerary.status = Some(STATUSES[id % STATUSES.len()].to_string());
    itinerary.sexual_orientation = Some("Straight".to_string());
    itinerary
}

fn create_criteria() -> SearchCriteria {
    let mut criteria = SearchCriteria::new(
        "Miami, FL, USA",
        NaiveDate::from_ymd_opt(2025, 11, 11).unwrap(),
        NaiveDate::from_ymd_opt(2025, 11, 30).unwrap(),
    );
    criteria.gender = Some("Female".to_string());
    criteria.sexual_orientation = Some(OrientationPreference::NoPreference);
    criteria.age_range = Some(AgeRange { lower: 21, upper: 45 });
    criteria.exclude((0..200).step_by(7).map(|i: usize| i.to_string()));
    criteria
}

fn bench_day_window(c: &mut Criterion) {
    c.bench_function("day_window_calculation", |b| {
        b.iter(|| calculate_day_window(black_box(base_date()), black_box(base_date() + Duration::days(19))));
    });
}

fn bench_filtering(c: &mut Criterion) {
    let criteria = create_criteria();

    let mut group = c.benchmark_group("filter_itineraries");

    for candidate_count in [10, 100, 1000, 10000].iter() {
        let candidates: Vec<Itinerary> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("filter", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| filter_itineraries(black_box(&criteria), black_box(candidates.clone())));
            },
        );
    }

    group.finish();
}

fn bench_paged_matching(c: &mut Criterion) {
    let matcher = Matcher::with_default_limit();
    let criteria = create_criteria();
    let candidates: Vec<Itinerary> = (0..1000).map(create_candidate).collect();

    c.bench_function("find_matches_1000_candidates", |b| {
        b.iter(|| {
            matcher.find_matches(
                black_box(&criteria),
                black_box(candidates.clone()),
                black_box(20),
                None,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_day_window,
    bench_filtering,
    bench_paged_matching
);

criterion_main!(benches);
