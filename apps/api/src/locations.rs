//! Korean province → district table and expansion of user location selections
//! into the `"{province} {district}"` labels stored in chunk metadata.

use std::collections::HashSet;

use serde::Serialize;

use crate::errors::AppError;

/// The one province indexed without districts.
pub const DISTRICTLESS_PROVINCE: &str = "세종";

/// Selection values meaning "no location constraint".
const ALL_SENTINELS: [&str; 2] = ["all", "전체"];

pub static PROVINCES: &[(&str, &[&str])] = &[
    (
        "서울",
        &[
            "종로구", "중구", "용산구", "성동구", "광진구", "동대문구", "중랑구", "성북구",
            "강북구", "도봉구", "노원구", "은평구", "서대문구", "마포구", "양천구", "강서구",
            "구로구", "금천구", "영등포구", "동작구", "관악구", "서초구", "강남구", "송파구",
            "강동구",
        ],
    ),
    (
        "부산",
        &[
            "중구", "서구", "동구", "영도구", "부산진구", "동래구", "남구", "북구", "해운대구",
            "사하구", "금정구", "강서구", "연제구", "수영구", "사상구", "기장군",
        ],
    ),
    (
        "대구",
        &["중구", "동구", "서구", "남구", "북구", "수성구", "달서구", "달성군", "군위군"],
    ),
    (
        "인천",
        &[
            "강화군", "옹진군", "중구", "동구", "미추홀구", "연수구", "남동구", "부평구",
            "계양구", "서구",
        ],
    ),
    ("광주", &["동구", "서구", "남구", "북구", "광산구"]),
    ("대전", &["동구", "중구", "서구", "유성구", "대덕구"]),
    ("울산", &["중구", "남구", "동구", "북구", "울주군"]),
    ("세종", &[]),
    (
        "경기",
        &[
            "수원시", "고양시", "용인시", "성남시", "부천시", "화성시", "안산시", "남양주시",
            "안양시", "평택시", "시흥시", "파주시", "의정부시", "김포시", "광주시", "광명시",
            "군포시", "하남시", "오산시", "양주시", "이천시", "구리시", "안성시", "포천시",
            "의왕시", "양평군", "여주시", "동두천시", "과천시", "가평군", "연천군",
        ],
    ),
    (
        "강원",
        &[
            "춘천시", "원주시", "강릉시", "동해시", "태백시", "속초시", "삼척시", "홍천군",
            "횡성군", "영월군", "평창군", "정선군", "철원군", "화천군", "양구군", "인제군",
            "고성군", "양양군",
        ],
    ),
    (
        "충북",
        &[
            "청주시", "충주시", "제천시", "보은군", "옥천군", "영동군", "증평군", "진천군",
            "괴산군", "음성군", "단양군",
        ],
    ),
    (
        "충남",
        &[
            "천안시", "공주시", "보령시", "아산시", "서산시", "논산시", "계룡시", "당진시",
            "금산군", "부여군", "서천군", "청양군", "홍성군", "예산군", "태안군",
        ],
    ),
    (
        "전북",
        &[
            "전주시", "군산시", "익산시", "정읍시", "남원시", "김제시", "완주군", "진안군",
            "무주군", "장수군", "임실군", "순창군", "고창군", "부안군",
        ],
    ),
    (
        "전남",
        &[
            "목포시", "여수시", "순천시", "나주시", "광양시", "담양군", "곡성군", "구례군",
            "고흥군", "보성군", "화순군", "장흥군", "강진군", "해남군", "영암군", "무안군",
            "함평군", "영광군", "장성군", "완도군", "진도군", "신안군",
        ],
    ),
    (
        "경북",
        &[
            "포항시", "경주시", "김천시", "안동시", "구미시", "영주시", "영천시", "상주시",
            "문경시", "경산시", "의성군", "청송군", "영양군", "영덕군", "청도군", "고령군",
            "성주군", "칠곡군", "예천군", "봉화군", "울진군", "울릉군",
        ],
    ),
    (
        "경남",
        &[
            "창원시", "진주시", "통영시", "사천시", "김해시", "밀양시", "거제시", "양산시",
            "의령군", "함안군", "창녕군", "고성군", "남해군", "하동군", "산청군", "함양군",
            "거창군", "합천군",
        ],
    ),
    ("제주", &["제주시", "서귀포시"]),
];

/// Either the "all" sentinel or an explicit (possibly empty) set of labels.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSelection {
    All,
    Only(Vec<String>),
}

#[derive(Debug, Serialize)]
pub struct ProvinceView {
    pub province: &'static str,
    pub districts: &'static [&'static str],
}

pub fn province_table() -> Vec<ProvinceView> {
    PROVINCES
        .iter()
        .map(|&(province, districts)| ProvinceView {
            province,
            districts,
        })
        .collect()
}

fn districts_of(province: &str) -> Option<&'static [&'static str]> {
    PROVINCES
        .iter()
        .find(|(p, _)| *p == province)
        .map(|(_, d)| *d)
}

/// Labels of every district of a province; the districtless province is its own label.
fn province_labels(province: &str, districts: &[&str]) -> Vec<String> {
    if districts.is_empty() {
        vec![province.to_string()]
    } else {
        districts.iter().map(|d| format!("{province} {d}")).collect()
    }
}

fn is_known_label(label: &str) -> bool {
    match label.split_once(' ') {
        Some((province, district)) => {
            districts_of(province).is_some_and(|ds| ds.contains(&district))
        }
        None => label == DISTRICTLESS_PROVINCE,
    }
}

/// Normalizes raw selection values.
///
/// - `"all"` / `"전체"` anywhere → `All`
/// - bare province → all of its district labels
/// - `"{province} {district}"` → kept
/// - anything else → validation error
///
/// First-seen order is kept and duplicates dropped.
pub fn resolve_selection(raw: &[String]) -> Result<LocationSelection, AppError> {
    if raw.iter().any(|v| ALL_SENTINELS.contains(&v.trim())) {
        return Ok(LocationSelection::All);
    }

    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for value in raw {
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        let expanded = if let Some(districts) = districts_of(&value) {
            province_labels(&value, districts)
        } else if is_known_label(&value) {
            vec![value]
        } else {
            return Err(AppError::Validation(format!("Unknown location '{value}'")));
        };
        for label in expanded {
            if seen.insert(label.clone()) {
                labels.push(label);
            }
        }
    }

    Ok(LocationSelection::Only(labels))
}
