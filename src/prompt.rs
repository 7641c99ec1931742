/// Instruction handed to the generator with the paragraph transcript
pub const SUMMARY: &str = "\
Summarize the following video transcript so that a reader who has not watched the video understands what it covers.

Structure the summary as:
- Introduction: the context and main subject of the video.
- Key Points: one short subsection per major idea, with the supporting details and notable moments.
- Conclusion: the main takeaways.

Keep it under 300 words, match the tone of the video, and write clean, error-free prose.";

/// Instruction handed with the timed transcript and the video URL
pub const TIMESTAMPS: &str = "\
Produce a chapter list for the following video transcript.

Each caption in the transcript is followed by a marker of the form \"time:HH:MM:SS\" giving the moment it was spoken. \
Use those markers to find where each major topic begins; never invent times that do not appear in the transcript.

Output one chapter per line, in chronological order, in exactly this form:
hh:mm:ss Topic Title

For example:
00:00:00 Introduction
00:03:12 Setting up the project
00:12:45 Common mistakes

Keep titles short but descriptive. Do not add any other text before or after the list.";

/// Instruction for cleaning up the paragraph transcript
pub const TRANSCRIPT: &str = "\
Rewrite the following raw video transcript into a clean, readable document.

- Keep the speaker's words and meaning; fix only punctuation, capitalization and obvious transcription errors.
- Split the text into paragraphs that follow the flow of the content, with a short heading at each major change of topic.
- Use bold for key terms and names.
- Do not summarize or leave anything out.";
