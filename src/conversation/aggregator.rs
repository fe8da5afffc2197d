//! Per-stream reply aggregation.
//!
//! A [`ReplyAggregator`] is created for each reply stream, fed one decoded
//! [`ReplyFragment`] at a time, and consumed by [`finalize`] when the stream
//! ends. It is never shared between streams and never reused.
//!
//! [`finalize`]: ReplyAggregator::finalize

use crate::conversation::types::{DisplayText, FinalizedReply, Language, ReplyFragment};

/// What the caller must do after one [`consume`] call.
///
/// [`consume`]: ReplyAggregator::consume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeEffect {
    /// Re-render the balloon with these per-language strings.
    pub display: DisplayText,
    /// Synthesize this text in the spoken language. Set only when this
    /// consume call updated the voice candidate.
    pub voice: Option<String>,
}

/// Accumulates per-language reply text across the fragments of one stream.
#[derive(Debug)]
pub struct ReplyAggregator {
    spoken: Language,
    ko: Vec<String>,
    jp: Vec<String>,
    en: Vec<String>,
    voice: Option<String>,
}

impl ReplyAggregator {
    /// Create a fresh aggregator for one stream.
    pub fn new(spoken: Language) -> Self {
        Self {
            spoken,
            ko: Vec::new(),
            jp: Vec::new(),
            en: Vec::new(),
            voice: None,
        }
    }

    /// Fold one fragment into the accumulators.
    ///
    /// Non-empty language fields are appended in list order. Text in the
    /// spoken language becomes the voice candidate, last writer wins both
    /// within and across fragments. Returns `None` when the fragment
    /// carried nothing (absent or empty `reply_list`, or all fields empty).
    pub fn consume(&mut self, fragment: &ReplyFragment) -> Option<ConsumeEffect> {
        let mut appended = false;
        let mut voice_update = None;

        for item in fragment.reply_list.as_deref().unwrap_or_default() {
            for language in Language::all() {
                let Some(text) = item.answer(language) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                self.sequence_mut(language).push(text.to_owned());
                appended = true;
                if language == self.spoken {
                    self.voice = Some(text.to_owned());
                    voice_update = Some(text.to_owned());
                }
            }
        }

        appended.then(|| ConsumeEffect {
            display: self.display(),
            voice: voice_update,
        })
    }

    /// Current space-joined render strings for all three languages.
    pub fn display(&self) -> DisplayText {
        DisplayText {
            ko: self.ko.join(" "),
            jp: self.jp.join(" "),
            en: self.en.join(" "),
        }
    }

    /// The latest spoken-language text seen so far.
    pub fn voice_candidate(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    /// Whether nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.ko.is_empty() && self.jp.is_empty() && self.en.is_empty()
    }

    /// Consume the aggregator into the final joined reply strings.
    pub fn finalize(self) -> FinalizedReply {
        FinalizedReply {
            ko: self.ko.join(" "),
            jp: self.jp.join(" "),
            en: self.en.join(" "),
        }
    }

    fn sequence_mut(&mut self, language: Language) -> &mut Vec<String> {
        match language {
            Language::Ko => &mut self.ko,
            Language::Jp => &mut self.jp,
            Language::En => &mut self.en,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::conversation::types::ReplyItem;

    fn fragment(items: Vec<ReplyItem>) -> ReplyFragment {
        ReplyFragment {
            query: None,
            reply_list: Some(items),
        }
    }

    fn en(text: &str) -> ReplyItem {
        ReplyItem {
            answer_en: Some(text.to_owned()),
            ..ReplyItem::default()
        }
    }

    #[test]
    fn accumulates_in_arrival_order() {
        let mut agg = ReplyAggregator::new(Language::En);
        agg.consume(&fragment(vec![en("Hi")]));
        agg.consume(&fragment(vec![en("there"), en("friend")]));

        let reply = agg.finalize();
        assert_eq!(reply.en, "Hi there friend");
        assert_eq!(reply.ko, "");
    }

    #[test]
    fn empty_reply_list_is_a_no_op() {
        let mut agg = ReplyAggregator::new(Language::En);
        assert!(agg.consume(&fragment(vec![])).is_none());
        assert!(agg.consume(&ReplyFragment::default()).is_none());
        assert!(agg.is_empty());
    }

    #[test]
    fn all_empty_fields_is_a_no_op() {
        let mut agg = ReplyAggregator::new(Language::En);
        let item = ReplyItem {
            answer_en: Some(String::new()),
            ..ReplyItem::default()
        };
        assert!(agg.consume(&fragment(vec![item])).is_none());
    }

    #[test]
    fn voice_candidate_is_last_writer_wins() {
        let mut agg = ReplyAggregator::new(Language::En);

        let effect = agg.consume(&fragment(vec![en("first"), en("second")])).unwrap();
        assert_eq!(effect.voice.as_deref(), Some("second"));

        let effect = agg.consume(&fragment(vec![en("third")])).unwrap();
        assert_eq!(effect.voice.as_deref(), Some("third"));
        assert_eq!(agg.voice_candidate(), Some("third"));
    }

    #[test]
    fn no_voice_update_without_spoken_language_text() {
        let mut agg = ReplyAggregator::new(Language::Jp);

        let effect = agg.consume(&fragment(vec![en("english only")])).unwrap();
        assert_eq!(effect.voice, None);
        assert_eq!(agg.voice_candidate(), None);
    }

    #[test]
    fn languages_accumulate_independently() {
        let mut agg = ReplyAggregator::new(Language::Ko);
        let item = ReplyItem {
            answer_ko: Some("안녕".to_owned()),
            answer_jp: Some("こんにちは".to_owned()),
            answer_en: Some("Hello".to_owned()),
        };
        let effect = agg.consume(&fragment(vec![item])).unwrap();

        assert_eq!(effect.display.ko, "안녕");
        assert_eq!(effect.display.jp, "こんにちは");
        assert_eq!(effect.display.en, "Hello");
        assert_eq!(effect.voice.as_deref(), Some("안녕"));
    }

    #[test]
    fn display_uses_full_history() {
        let mut agg = ReplyAggregator::new(Language::En);
        agg.consume(&fragment(vec![en("Hi")]));
        let effect = agg.consume(&fragment(vec![en("there")])).unwrap();
        assert_eq!(effect.display.en, "Hi there");
        assert_eq!(effect.display.for_language(Language::En), "Hi there");
    }

    #[test]
    fn identical_streams_finalize_identically() {
        let fragments = vec![
            fragment(vec![en("Hi"), en("there")]),
            fragment(vec![]),
            fragment(vec![en("friend")]),
        ];

        let mut a = ReplyAggregator::new(Language::En);
        let mut b = ReplyAggregator::new(Language::En);
        for f in &fragments {
            a.consume(f);
            b.consume(f);
        }
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn finalize_on_empty_stream_yields_empty_strings() {
        let agg = ReplyAggregator::new(Language::En);
        assert_eq!(agg.finalize(), FinalizedReply::default());
    }
}
