use crate::core::grid::count_completed_lines;
use crate::domain::model::{Student, StudentId};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Characters stripped from every import line.
const IMPORT_STRIP: &[char] = &['"', '\'', '{', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由儲存的 JSON 還原；格式錯誤時回到空名單
    pub fn from_slot_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Vec<Student>>(bytes) {
            Ok(students) => Self::from_students(students),
            Err(e) => {
                tracing::warn!("⚠️ Stored roster is malformed, starting empty: {}", e);
                Self::new()
            }
        }
    }

    pub fn from_students(students: Vec<Student>) -> Self {
        let mut seen = HashSet::new();
        let students = students
            .into_iter()
            .filter(|s| {
                let fresh = seen.insert(s.id.clone());
                if !fresh {
                    tracing::warn!("Dropping duplicate student id {}", s.id);
                }
                fresh
            })
            .collect();
        Self { students }
    }

    pub fn to_slot_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.students)
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn find(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|s| &s.id == id)
    }

    pub fn find_mut(&mut self, id: &StudentId) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| &s.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    /// Appends a student with an empty card. Blank names are ignored.
    pub fn add(&mut self, name: &str) -> Option<StudentId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id = self.generate_id();
        self.students.push(Student::new(id.clone(), name));
        Some(id)
    }

    pub fn remove(&mut self, id: &StudentId) -> bool {
        let before = self.students.len();
        self.students.retain(|s| &s.id != id);
        self.students.len() != before
    }

    /// Adds one student per usable line and returns how many were added.
    pub fn bulk_import(&mut self, text: &str) -> usize {
        text.lines()
            .filter_map(clean_import_line)
            .filter(|name| self.add(name).is_some())
            .count()
    }

    /// Most lines first, then by name.
    pub fn rank(&self) -> Vec<&Student> {
        rank(&self.students)
    }

    pub fn total_collected(&self) -> u64 {
        total_collected(&self.students)
    }

    fn generate_id(&self) -> StudentId {
        loop {
            let seq = ID_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed);
            let candidate = StudentId::from(format!(
                "{}{}",
                Utc::now().timestamp_millis(),
                to_base36(seq + u64::from(Utc::now().timestamp_subsec_nanos()))
            ));
            if self.find(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

/// 清理匯入的一行：去掉引號和大括號，略過空白行與標題列 "name"
pub fn clean_import_line(line: &str) -> Option<String> {
    let cleaned: String = line.chars().filter(|c| !IMPORT_STRIP.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("name") {
        None
    } else {
        Some(cleaned.to_string())
    }
}

pub fn rank(students: &[Student]) -> Vec<&Student> {
    let mut ranked: Vec<(usize, NameKey, &Student)> = students
        .iter()
        .map(|s| (count_completed_lines(&s.card_counts), NameKey::new(&s.name), s))
        .collect();
    ranked.sort_by(|(lines_a, key_a, _), (lines_b, key_b, _)| {
        lines_b.cmp(lines_a).then_with(|| key_a.cmp(key_b))
    });
    ranked.into_iter().map(|(_, _, s)| s).collect()
}

pub fn total_collected(students: &[Student]) -> u64 {
    students.iter().map(Student::total_collected).sum()
}

/// Collation key for display names.
///
/// Levels, compared in order: base letters without accents or case, then
/// accents, then the raw string. "Émile" sorts with the E's, before "Zoe".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NameKey {
    base: String,
    accented: String,
    raw: String,
}

impl NameKey {
    pub fn new(name: &str) -> Self {
        let accented: String = name.nfd().flat_map(char::to_lowercase).collect();
        let base = accented.chars().filter(|c| !is_combining_mark(*c)).collect();
        Self {
            base,
            accented,
            raw: name.to_string(),
        }
    }
}

pub fn compare_names(a: &str, b: &str) -> Ordering {
    NameKey::new(a).cmp(&NameKey::new(b))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
