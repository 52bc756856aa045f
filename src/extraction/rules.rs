//! Rule-based overrides for surgeons and in/out times
//!
//! These run on the raw transcript and win over the model whenever they
//! match. When they don't match, the model value is left alone.

use lazy_static::lazy_static;
use regex::Regex;

use crate::schema::OrForm;

lazy_static! {
    static ref PUNCTUATION_RE: Regex = Regex::new(r"[,.;]+").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref SURGEON_ONE_RE: Regex = Regex::new(r"\b(?:surgeon one|first surgeon)\b").unwrap();
    static ref SURGEON_TWO_RE: Regex = Regex::new(r"\b(?:surgeon two|second surgeon)\b").unwrap();
    static ref SLOT_ONE_MARKER_RE: Regex = Regex::new(r"\bsurgeon\s*1\b\s+").unwrap();
    static ref SLOT_TWO_MARKER_RE: Regex = Regex::new(r"\bsurgeon\s*2\b\s+").unwrap();
    static ref TITLE_RE: Regex = Regex::new(r"^(?:dr|doctor)\b\s*").unwrap();
    static ref NAME_STOP_RE: Regex = Regex::new(r"\b(?:surgeon|in|out|end)\b").unwrap();
    static ref NAME_TOKEN_RE: Regex = Regex::new(r"^[a-z\-]+$").unwrap();
    static ref CLOCK_TIME_RE: Regex = Regex::new(r"\b(\d{1,2}):(\d{2})\s*(am|pm)\b").unwrap();
    static ref DIGIT_TIME_RE: Regex = Regex::new(r"\b(\d{3,4})\s*(am|pm)\b").unwrap();
    static ref IN_AFTER_RE: Regex = keyword_then_time("in");
    static ref IN_BEFORE_RE: Regex = time_then_keyword("in");
    static ref OUT_AFTER_RE: Regex = keyword_then_time("out");
    static ref OUT_BEFORE_RE: Regex = time_then_keyword("out");
}

const TIME_PATTERN: &str = r"(\d{1,2}:\d{2}\s*(?:am|pm)|\d{3,4}\s*(?:am|pm))";

fn keyword_then_time(keyword: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b\s+{}", keyword, TIME_PATTERN)).unwrap()
}

fn time_then_keyword(keyword: &str) -> Regex {
    Regex::new(&format!(r"{}\s+\b{}\b", TIME_PATTERN, keyword)).unwrap()
}

/// Surgeon names found by the slot rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurgeonSlots {
    pub surgeon_1: Option<String>,
    pub surgeon_2: Option<String>,
}

/// Overwrite surgeon and in/out fields wherever a rule matches, and set the
/// free-text notes.
pub fn apply_overrides(form: &mut OrForm, transcript: &str) {
    let surgeons = extract_surgeons(transcript);
    if let Some(name) = surgeons.surgeon_1 {
        tracing::debug!("Rule override: surgeon_1 = {}", name);
        form.personnel.surgeon_1 = Some(name);
    }
    if let Some(name) = surgeons.surgeon_2 {
        tracing::debug!("Rule override: surgeon_2 = {}", name);
        form.personnel.surgeon_2 = Some(name);
    }

    if let Some(time) = extract_in_time(transcript) {
        tracing::debug!("Rule override: in = {}", time);
        form.times.in_room = Some(time);
    }
    if let Some(time) = extract_out_time(transcript) {
        tracing::debug!("Rule override: out = {}", time);
        form.times.out_room = Some(time);
    }

    form.free_notes = transcript.trim().to_string();
}

/// Lower-case, normalize spoken am/pm, strip `,.;` and collapse whitespace
pub fn clean_transcript(transcript: &str) -> String {
    let text = transcript
        .trim()
        .to_lowercase()
        .replace("p.m.", "pm")
        .replace("a.m.", "am")
        .replace("p.m", "pm")
        .replace("a.m", "am");
    let text = PUNCTUATION_RE.replace_all(&text, " ");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Find names after explicit "surgeon 1" / "surgeon 2" markers
pub fn extract_surgeons(transcript: &str) -> SurgeonSlots {
    let text = clean_transcript(transcript);
    let text = SURGEON_ONE_RE.replace_all(&text, "surgeon 1");
    let text = SURGEON_TWO_RE.replace_all(&text, "surgeon 2");

    SurgeonSlots {
        surgeon_1: surgeon_after(&text, &SLOT_ONE_MARKER_RE),
        surgeon_2: surgeon_after(&text, &SLOT_TWO_MARKER_RE),
    }
}

fn surgeon_after(text: &str, marker: &Regex) -> Option<String> {
    let found = marker.find(text)?;

    // Stops at a keyword even inside a hyphenated token ("end-of-case")
    let rest = &text[found.end()..];
    let captured = match NAME_STOP_RE.find(rest) {
        Some(stop) => &rest[..stop.start()],
        None => rest,
    };
    let captured = TITLE_RE.replace(captured.trim(), "");

    let tokens: Vec<&str> = captured
        .split_whitespace()
        .filter(|token| NAME_TOKEN_RE.is_match(token))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

pub fn extract_in_time(transcript: &str) -> Option<String> {
    extract_time(transcript, &IN_AFTER_RE, &IN_BEFORE_RE)
}

pub fn extract_out_time(transcript: &str) -> Option<String> {
    extract_time(transcript, &OUT_AFTER_RE, &OUT_BEFORE_RE)
}

/// `<keyword> <time>` takes precedence over `<time> <keyword>`
fn extract_time(transcript: &str, after: &Regex, before: &Regex) -> Option<String> {
    let text = clean_transcript(transcript);
    after
        .captures(&text)
        .or_else(|| before.captures(&text))
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_clock_time(m.as_str()))
}

/// "930 pm" -> "9:30 pm", "0530 am" -> "5:30 am", "09:30 pm" -> "9:30 pm"
pub fn normalize_clock_time(raw: &str) -> String {
    let raw = raw.trim().to_lowercase().replace('.', "");
    let raw = WHITESPACE_RE.replace_all(&raw, " ").into_owned();

    if let Some(caps) = CLOCK_TIME_RE.captures(&raw) {
        if let Ok(hour) = caps[1].parse::<u32>() {
            return format!("{}:{} {}", hour, &caps[2], &caps[3]);
        }
    }

    if let Some(caps) = DIGIT_TIME_RE.captures(&raw) {
        let digits = &caps[1];
        let (hour, minute) = digits.split_at(if digits.len() == 3 { 1 } else { 2 });
        if let Ok(hour) = hour.parse::<u32>() {
            return format!("{}:{} {}", hour, minute, &caps[2]);
        }
    }

    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_transcript_normalizes_meridiem_and_punctuation() {
        assert_eq!(
            clean_transcript("  In at 9:30 P.M.; out, 11 a.m  "),
            "in at 9:30 pm out 11 am"
        );
    }

    #[test]
    fn surgeon_slots_from_explicit_markers() {
        let slots = extract_surgeons("Surgeon 1 John Smith, surgeon 2 Dr. Mary-Jane Doe in 930 pm");
        assert_eq!(slots.surgeon_1.as_deref(), Some("john smith"));
        assert_eq!(slots.surgeon_2.as_deref(), Some("mary-jane doe"));
    }

    #[test]
    fn spelled_out_surgeon_markers() {
        let slots = extract_surgeons("first surgeon doctor adams second surgeon baker out 5 pm");
        assert_eq!(slots.surgeon_1.as_deref(), Some("adams"));
        assert_eq!(slots.surgeon_2.as_deref(), Some("baker"));

        let slots = extract_surgeons("surgeon one lee surgeon two kim");
        assert_eq!(slots.surgeon_1.as_deref(), Some("lee"));
        assert_eq!(slots.surgeon_2.as_deref(), Some("kim"));
    }

    #[test]
    fn surgeon_capture_keeps_only_name_like_tokens() {
        let slots = extract_surgeons("surgeon 1 ahmed 2nd year ali end of case");
        assert_eq!(slots.surgeon_1.as_deref(), Some("ahmed year ali"));
        assert_eq!(slots.surgeon_2, None);
    }

    #[test]
    fn surgeon_marker_without_name_is_none() {
        assert_eq!(extract_surgeons("surgeon 1 in 930 pm").surgeon_1, None);
        assert_eq!(extract_surgeons("the surgeon was late").surgeon_1, None);
        assert_eq!(extract_surgeons("").surgeon_1, None);
    }

    #[test]
    fn surgeon_capture_stops_inside_hyphenated_keyword() {
        let slots = extract_surgeons("surgeon 1 john smith end-of-case notes");
        assert_eq!(slots.surgeon_1.as_deref(), Some("john smith"));

        let slots = extract_surgeons("surgeon 2 lee out-patient review");
        assert_eq!(slots.surgeon_2.as_deref(), Some("lee"));
    }

    #[test]
    fn surgeon_capture_keeps_words_containing_keywords() {
        let slots = extract_surgeons("surgeon 1 linda inman out 5 pm");
        assert_eq!(slots.surgeon_1.as_deref(), Some("linda inman"));
    }

    #[test]
    fn in_and_out_times_either_side_of_keyword() {
        assert_eq!(extract_in_time("patient in 930 pm").as_deref(), Some("9:30 pm"));
        assert_eq!(extract_in_time("9:05 a.m. in").as_deref(), Some("9:05 am"));
        assert_eq!(extract_out_time("out 0530 am").as_deref(), Some("5:30 am"));
        assert_eq!(extract_out_time("1145pm out").as_deref(), Some("11:45 pm"));
    }

    #[test]
    fn keyword_first_pattern_wins() {
        let text = "815 pm in theatre then in 830 pm";
        assert_eq!(extract_in_time(text).as_deref(), Some("8:30 pm"));
    }

    #[test]
    fn times_without_meridiem_do_not_match() {
        assert_eq!(extract_in_time("in 930"), None);
        assert_eq!(extract_out_time("took it out quickly"), None);
        assert_eq!(extract_in_time("begin 930 pm"), None);
    }

    #[test]
    fn normalize_clock_time_strips_leading_zero() {
        assert_eq!(normalize_clock_time("09:30 PM"), "9:30 pm");
        assert_eq!(normalize_clock_time("930 pm"), "9:30 pm");
        assert_eq!(normalize_clock_time("0530am"), "5:30 am");
        assert_eq!(normalize_clock_time("noon"), "noon");
    }

    #[test]
    fn overrides_replace_model_values_only_on_match() {
        let mut form = OrForm::default();
        form.personnel.surgeon_1 = Some("model guess".to_string());
        form.times.in_room = Some("model in".to_string());
        form.times.out_room = Some("model out".to_string());

        apply_overrides(&mut form, " surgeon 1 john smith in 930 pm ");

        assert_eq!(form.personnel.surgeon_1.as_deref(), Some("john smith"));
        assert_eq!(form.times.in_room.as_deref(), Some("9:30 pm"));
        assert_eq!(form.times.out_room.as_deref(), Some("model out"));
        assert_eq!(form.free_notes, "surgeon 1 john smith in 930 pm");
    }
}
