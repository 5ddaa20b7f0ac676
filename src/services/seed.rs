// src/services/seed.rs

use crate::models::{category::Category, question::NewQuestion};

/// (text, answer, difficulty, hint)
type SeedRow = (&'static str, &'static str, i16, &'static str);

const GEOGRAPHY: &[SeedRow] = &[
    ("What is the capital city of Australia?", "CANBERRA", 3, "This city has 8 letters"),
    ("What is the largest ocean on Earth?", "PACIFIC", 2, "This ocean has 7 letters"),
    ("What is the longest river in the world?", "NILE", 2, "African river with 4 letters"),
    ("Which mountain range contains Mount Everest?", "HIMALAYAS", 3, "Asian mountain range with 9 letters"),
    ("What is the smallest country in the world?", "VATICAN", 3, "City-state in Rome with 7 letters"),
    ("Which desert is the largest hot desert in the world?", "SAHARA", 2, "African desert with 6 letters"),
];

const HISTORY: &[SeedRow] = &[
    ("In which year did World War II end?", "1945", 2, "Four digit year in the 1940s"),
    ("Who was the first person to walk on the moon?", "ARMSTRONG", 2, "American astronaut, last name has 9 letters"),
    ("Who was the last pharaoh of Egypt?", "CLEOPATRA", 3, "Famous queen with 9 letters"),
    ("In which year did the Berlin Wall fall?", "1989", 3, "Four digit year in the 1980s"),
    ("Who invented the printing press?", "GUTENBERG", 3, "German inventor with 9 letters"),
];

const SCIENCE: &[SeedRow] = &[
    ("What is the chemical symbol for gold?", "AU", 2, "Two letters from the Latin name"),
    ("What is the hardest natural substance?", "DIAMOND", 2, "Precious stone with 7 letters"),
    ("How many bones are in an adult human body?", "206", 3, "Three digit number over 200"),
    ("What gas makes up most of Earth's atmosphere?", "NITROGEN", 3, "Chemical element with 8 letters"),
    ("Which planet is closest to the Sun?", "MERCURY", 2, "Planet named after a Roman god, 7 letters"),
];

const ARTS: &[SeedRow] = &[
    ("Which artist painted the Mona Lisa?", "LEONARDO", 3, "Renaissance artist, first name has 8 letters"),
    ("What is Michelangelo's most famous sculpture?", "DAVID", 2, "Biblical figure with 5 letters"),
    ("Who composed 'The Four Seasons'?", "VIVALDI", 4, "Italian composer with 7 letters"),
    ("Which museum houses the Mona Lisa?", "LOUVRE", 3, "Famous Paris museum with 6 letters"),
    ("Who wrote 'Romeo and Juliet'?", "SHAKESPEARE", 2, "English playwright with 11 letters"),
];

const SPORTS: &[SeedRow] = &[
    ("How many players are on a soccer team on the field?", "ELEVEN", 2, "Number spelled out with 6 letters"),
    ("In which sport is a shuttlecock used?", "BADMINTON", 3, "Racket sport with 9 letters"),
    ("What is the maximum score in ten-pin bowling?", "300", 3, "Three digit number"),
    ("Which country hosted the 2016 Summer Olympics?", "BRAZIL", 2, "South American country with 6 letters"),
    ("How many holes are there on a standard golf course?", "EIGHTEEN", 2, "Number spelled out with 8 letters"),
];

/// Built-in questions used when the trivia source cannot fill an empty category.
pub fn fallback_questions(category: Category) -> Vec<NewQuestion> {
    let rows = match category {
        Category::Geography => GEOGRAPHY,
        Category::History => HISTORY,
        Category::Science => SCIENCE,
        Category::Arts => ARTS,
        Category::Sports => SPORTS,
    };

    rows.iter()
        .map(|(text, answer, difficulty, hint)| NewQuestion {
            text: (*text).to_string(),
            answer: (*answer).to_string(),
            category,
            difficulty: *difficulty,
            hint: Some((*hint).to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_answers_are_canonical() {
        for category in Category::ALL {
            let rows = fallback_questions(category);
            assert!(!rows.is_empty());
            for q in rows {
                assert_eq!(q.answer, q.answer.trim().to_uppercase());
                assert!((1..=5).contains(&q.difficulty));
            }
        }
    }
}
