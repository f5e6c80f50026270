use super::*;

#[test]
fn test_grade_index_boundaries() {
    let profile = ReportProfile::default_v1();
    assert_eq!(profile.grades[profile.grade_index(150.0)].label, "A+");
    assert_eq!(profile.grades[profile.grade_index(70.0)].label, "A+");
    assert_eq!(profile.grades[profile.grade_index(69.99)].label, "A");
    assert_eq!(profile.grades[profile.grade_index(30.0)].label, "C+");
    assert_eq!(profile.grades[profile.grade_index(0.0)].label, "C");
    assert_eq!(profile.grades[profile.grade_index(-3.0)].label, "C");
}

#[test]
fn test_grade_upper_bounds() {
    let profile = ReportProfile::default_v1();
    assert_eq!(profile.grade_upper(0), None);
    assert_eq!(profile.grade_upper(1), Some(70.0));
    assert_eq!(profile.grade_upper(5), Some(30.0));
}

#[test]
fn test_with_top_n() {
    let profile = ReportProfile::default_v1().with_top_n(3);
    assert_eq!(profile.top_n, 3);
    assert_eq!(profile.decimals, 2);
}

#[test]
fn test_placement_profile_defaults() {
    let profile = PlacementProfile::default_v1();
    assert_eq!(profile.top_performers, 5);
    assert_eq!(profile.similar_window, 5.0);
    assert_eq!(profile.similar_limit, 10);
    assert_eq!(profile.regional_top, 3);
}
