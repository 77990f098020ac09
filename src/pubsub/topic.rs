/// Разделитель уровней иерархии в имени темы.
pub const LEVEL_SEPARATOR: char = '.';

/// Итератор по уровням иерархии темы: от полного имени к самому
/// короткому префиксу.
///
/// Каждый следующий уровень получается отсечением имени по последнему
/// разделителю `.`:
///
/// ```
/// use dotbus::pubsub::TopicLevels;
///
/// let levels: Vec<_> = TopicLevels::new("app.module.event").collect();
/// assert_eq!(levels, ["app.module.event", "app.module", "app"]);
/// ```
///
/// Содержимое сегментов не проверяется: тема считается непрозрачным ключом.
#[derive(Debug, Clone)]
pub struct TopicLevels<'a> {
    rest: Option<&'a str>,
}

impl<'a> TopicLevels<'a> {
    pub fn new(topic: &'a str) -> Self {
        Self { rest: Some(topic) }
    }
}

impl<'a> Iterator for TopicLevels<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.rest?;
        self.rest = current
            .rfind(LEVEL_SEPARATOR)
            .map(|pos| &current[..pos]);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.rest {
            Some(rest) => {
                let n = rest.matches(LEVEL_SEPARATOR).count() + 1;
                (n, Some(n))
            }
            None => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for TopicLevels<'_> {}

impl std::iter::FusedIterator for TopicLevels<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет обход трёхуровневой темы от полного имени к корню.
    #[test]
    fn test_levels_walk_outward() {
        let levels: Vec<_> = TopicLevels::new("a.b.c").collect();
        assert_eq!(levels, vec!["a.b.c", "a.b", "a"]);
    }

    /// Тест проверяет, что тема без разделителей даёт ровно один уровень.
    #[test]
    fn test_single_segment() {
        let levels: Vec<_> = TopicLevels::new("news").collect();
        assert_eq!(levels, vec!["news"]);
    }

    /// Тест проверяет пустую тему: она сама является единственным уровнем.
    #[test]
    fn test_empty_topic() {
        let levels: Vec<_> = TopicLevels::new("").collect();
        assert_eq!(levels, vec![""]);
    }

    /// Тест проверяет, что пустые сегменты не валидируются и проходят
    /// как есть.
    #[test]
    fn test_empty_segments_are_kept() {
        let levels: Vec<_> = TopicLevels::new("a..b").collect();
        assert_eq!(levels, vec!["a..b", "a.", "a"]);

        let levels: Vec<_> = TopicLevels::new(".a").collect();
        assert_eq!(levels, vec![".a", ""]);
    }

    /// Тест проверяет, что `len()` совпадает с реальным числом уровней.
    #[test]
    fn test_exact_size() {
        let mut levels = TopicLevels::new("x.y.z.w");
        assert_eq!(levels.len(), 4);
        levels.next();
        assert_eq!(levels.len(), 3);
        levels.by_ref().for_each(drop);
        assert_eq!(levels.len(), 0);
        assert_eq!(levels.next(), None);
    }
}
