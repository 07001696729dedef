use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use quiz_core::model::{Question, Topic};

/// Pick up to `count` questions uniformly at random without replacement.
///
/// Returns every question (in random order) when fewer than `count` exist.
pub(crate) fn sample_questions<R: Rng + ?Sized>(
    mut questions: Vec<Question>,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    questions.shuffle(rng);
    questions.truncate(count);
    questions
}

/// Pick one topic uniformly at random.
pub(crate) fn choose_topic<'a, R: Rng + ?Sized>(topics: &'a [Topic], rng: &mut R) -> Option<&'a Topic> {
    topics.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Answer, QuestionId, TopicId};
    use std::collections::HashSet;

    fn questions(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    TopicId::new(1),
                    format!("Q{id}"),
                    vec!["a".into(), "b".into()],
                    Answer::Single(0),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn sample_is_capped_by_available_questions() {
        let picked = sample_questions(questions(3), 5, &mut rand::rng());
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn sample_has_no_duplicates() {
        let picked = sample_questions(questions(20), 7, &mut rand::rng());
        assert_eq!(picked.len(), 7);
        let ids: HashSet<_> = picked.iter().map(Question::id).collect();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn no_topics_means_no_choice() {
        assert!(choose_topic(&[], &mut rand::rng()).is_none());
        let topics = vec![Topic::new(TopicId::new(4), "Only", None).unwrap()];
        assert_eq!(choose_topic(&topics, &mut rand::rng()).unwrap().id(), TopicId::new(4));
    }
}
