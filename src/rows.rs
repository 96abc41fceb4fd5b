use crate::types::{MeetingInfo, OutputRow};

/// One row per speech, with the meeting's date, name and topics repeated on
/// each. Meetings without speeches contribute nothing.
pub fn project_rows(meetings: &[MeetingInfo]) -> Vec<OutputRow> {
    meetings.iter().flat_map(meeting_rows).collect()
}

fn meeting_rows(meeting: &MeetingInfo) -> impl Iterator<Item = OutputRow> + '_ {
    let topics = meeting.topics.join(",");

    meeting.speeches.iter().map(move |speech| OutputRow {
        date: meeting.date,
        meeting_name: meeting.name.clone(),
        speaker_name: speech.speaker.name.clone(),
        attributes: speech.speaker.attributes.join(", "),
        duration_min: speech.duration_min,
        topics: topics.clone(),
    })
}
