//! Нарезка транскрипта эпизода на окна ~заданной длительности.
//!
//! Жадный проход: для каждого сегмента сравниваем ошибку «закрыть окно
//! сейчас» `|D - acc|` с ошибкой «взять сегмент и закрыть» `|D - acc - len|`.
//! Закрываем, только если остановиться строго лучше. Короткий сегмент
//! (`len <= merge_threshold`) на закрытии вливается в закрываемое окно,
//! длинный начинает следующее.
//!
//! Режимы:
//! - `NoOverlap`: окна встык, без дублей;
//! - `SlidingOverlap`: хвост закрытого окна (не длиннее D) переезжает в следующее;
//! - `HalfTextOverlap`: окна встык, но к закрытому окну добавляется первая
//!   половина следующего сегмента (по границе слова), конец сдвигается на его середину.
//!
//! Состояние живёт только внутри одного вызова `segment` (один эпизод).

use crate::common::strings::half_prefix;
use crate::{Document, EpisodeKey, TranscriptSegment, WindowMode};
use std::collections::VecDeque;

pub const DEFAULT_TARGET_SECS: f64 = 30.0;
pub const DEFAULT_MERGE_THRESHOLD_SECS: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    /// Целевая длительность окна D, сек.
    pub target_secs: f64,
    pub mode: WindowMode,
    /// Сегменты не длиннее порога вливаются в закрываемое окно (граница включительно).
    pub merge_threshold_secs: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            target_secs: DEFAULT_TARGET_SECS,
            mode: WindowMode::NoOverlap,
            merge_threshold_secs: DEFAULT_MERGE_THRESHOLD_SECS,
        }
    }
}

impl WindowConfig {
    pub fn with_target(mut self, secs: f64) -> Self {
        self.target_secs = secs;
        self
    }

    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Закрытое окно до присвоения id.
#[derive(Debug, Clone, PartialEq)]
struct Window {
    start: f64,
    end: f64,
    text: String,
    /// индекс первого сегмента, не вошедшего в окно (для look-ahead)
    next: usize,
}

/// Аккумулятор текущего окна (режимы без перекрытия).
#[derive(Default)]
struct Acc<'a> {
    texts: Vec<&'a str>,
    start: f64,
    end: f64,
    size: f64,
}

impl<'a> Acc<'a> {
    fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    fn fold(&mut self, s: &'a TranscriptSegment) {
        if self.is_empty() {
            self.start = s.start_time;
        }
        self.texts.push(&s.text);
        self.size += s.duration();
        self.end = s.end_time;
    }

    /// Закрыть окно; пустое не эмитим.
    fn take(&mut self, next: usize) -> Option<Window> {
        let acc = std::mem::take(self);
        if acc.is_empty() {
            return None;
        }
        Some(Window {
            start: acc.start,
            end: acc.end,
            text: acc.texts.join(" "),
            next,
        })
    }
}

/// true: закрыть окно сейчас строго лучше, чем включить сегмент длины `len`.
fn stop_is_better(target: f64, acc_size: f64, len: f64) -> bool {
    (target - acc_size).abs() < (target - acc_size - len).abs()
}

pub struct WindowSegmenter {
    cfg: WindowConfig,
}

impl WindowSegmenter {
    pub fn new(cfg: WindowConfig) -> Self {
        Self { cfg }
    }

    /// Нарезать сегменты одного эпизода на документы (id присваивается здесь же).
    pub fn segment(&self, key: &EpisodeKey, segments: &[TranscriptSegment]) -> Vec<Document> {
        let windows = match self.cfg.mode {
            WindowMode::NoOverlap => self.no_overlap(segments),
            WindowMode::SlidingOverlap => self.sliding(segments),
            WindowMode::HalfTextOverlap => self.half_text(segments),
        };
        windows
            .into_iter()
            .map(|w| Document::new(key, w.start, w.end, w.text))
            .collect()
    }

    fn no_overlap<'a>(&self, segs: &'a [TranscriptSegment]) -> Vec<Window> {
        let mut out = Vec::new();
        let mut acc = Acc::default();

        for (i, s) in segs.iter().enumerate() {
            let len = s.duration();
            if !stop_is_better(self.cfg.target_secs, acc.size, len) {
                acc.fold(s);
                continue;
            }
            if len <= self.cfg.merge_threshold_secs {
                // короткий хвост вливаем в закрываемое окно
                acc.fold(s);
                out.extend(acc.take(i + 1));
            } else {
                out.extend(acc.take(i));
                acc.fold(s);
            }
        }
        out.extend(acc.take(segs.len()));
        out
    }

    fn sliding<'a>(&self, segs: &'a [TranscriptSegment]) -> Vec<Window> {
        let target = self.cfg.target_secs;
        let mut out = Vec::new();
        let mut start_times: VecDeque<f64> = VecDeque::new();
        let mut texts: VecDeque<&'a str> = VecDeque::new();
        let mut acc_end = 0.0;

        let emit = |start_times: &VecDeque<f64>, texts: &VecDeque<&str>, end: f64| Window {
            start: start_times[0],
            end,
            text: texts.iter().copied().collect::<Vec<_>>().join(" "),
            next: segs.len(),
        };

        for s in segs {
            let len = s.duration();
            if start_times.is_empty() {
                start_times.push_back(s.start_time);
                texts.push_back(&s.text);
                acc_end = s.end_time;
                continue;
            }

            let acc_size = acc_end - start_times[0];
            if !stop_is_better(target, acc_size, len) {
                start_times.push_back(s.start_time);
                texts.push_back(&s.text);
                acc_end = s.end_time;
                continue;
            }

            if len <= self.cfg.merge_threshold_secs {
                start_times.push_back(s.start_time);
                texts.push_back(&s.text);
                acc_end = s.end_time;
                out.push(emit(&start_times, &texts, acc_end));
            } else {
                out.push(emit(&start_times, &texts, acc_end));
                start_times.push_back(s.start_time);
                texts.push_back(&s.text);
                acc_end = s.end_time;
            }

            // всё, что укладывается в D от конца, остаётся перекрытием со следующим окном;
            // последний сегмент не выкидываем никогда
            while start_times.len() > 1 && acc_end - start_times[0] > target {
                start_times.pop_front();
                texts.pop_front();
            }
        }

        // остаток очереди: перекрытие за последней границей, отдельный слот
        if !start_times.is_empty() {
            out.push(emit(&start_times, &texts, acc_end));
        }
        out
    }

    fn half_text(&self, segs: &[TranscriptSegment]) -> Vec<Window> {
        let mut windows = self.no_overlap(segs);
        for w in &mut windows {
            if let Some((prefix, mid)) = segs.get(w.next).and_then(half_overlap) {
                w.text.push(' ');
                w.text.push_str(prefix);
                w.end = w.end.max(mid);
            }
        }
        windows
    }
}

/// Первая половина текста сегмента и середина его интервала.
/// `None`: перекрытия нет (пустой текст, нет пробела после середины).
fn half_overlap(s: &TranscriptSegment) -> Option<(&str, f64)> {
    let prefix = half_prefix(&s.text)?;
    Some((prefix, (s.start_time + s.end_time) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> EpisodeKey {
        EpisodeKey::new("show", "ep").unwrap()
    }

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    fn run(mode: WindowMode, target: f64, segs: &[TranscriptSegment]) -> Vec<Document> {
        WindowSegmenter::new(WindowConfig::default().with_target(target).with_mode(mode))
            .segment(&key(), segs)
    }

    fn spans(docs: &[Document]) -> Vec<(f64, f64)> {
        docs.iter().map(|d| (d.start_time, d.end_time)).collect()
    }

    #[test]
    fn empty_input_no_documents() {
        for mode in [
            WindowMode::NoOverlap,
            WindowMode::SlidingOverlap,
            WindowMode::HalfTextOverlap,
        ] {
            assert!(run(mode, 30.0, &[]).is_empty());
        }
    }

    #[test]
    fn no_overlap_groups_to_target() {
        // 10-секундные сегменты, D=30: на 4-м сегменте |30-30|=0 < |30-40|=10 -> закрыть,
        // len=10 <= 15 -> вливается, окно 0..40
        let segs: Vec<_> = (0..8)
            .map(|i| seg(i as f64 * 10.0, (i + 1) as f64 * 10.0, &format!("s{i}")))
            .collect();
        let docs = run(WindowMode::NoOverlap, 30.0, &segs);
        assert_eq!(spans(&docs), vec![(0.0, 40.0), (40.0, 80.0)]);
        assert_eq!(docs[0].text, "s0 s1 s2 s3");
        assert_eq!(docs[1].text, "s4 s5 s6 s7");
    }

    #[test]
    fn tie_folds_segment_in() {
        // acc=20, len=20, D=30: |10| >= |-10| -> берём
        let segs = vec![seg(0.0, 20.0, "a"), seg(20.0, 40.0, "b")];
        let docs = run(WindowMode::NoOverlap, 30.0, &segs);
        assert_eq!(spans(&docs), vec![(0.0, 40.0)]);
    }

    #[test]
    fn merge_threshold_is_inclusive() {
        // acc=30 после первого сегмента; следующий закрывает окно
        let merged = run(
            WindowMode::NoOverlap,
            30.0,
            &[seg(0.0, 30.0, "a"), seg(30.0, 45.0, "b")],
        );
        assert_eq!(spans(&merged), vec![(0.0, 45.0)]);

        let split = run(
            WindowMode::NoOverlap,
            30.0,
            &[seg(0.0, 30.0, "a"), seg(30.0, 45.01, "b")],
        );
        assert_eq!(spans(&split), vec![(0.0, 30.0), (30.0, 45.01)]);
        assert_eq!(split[1].text, "b");
    }

    #[test]
    fn long_first_segment_does_not_emit_empty_window() {
        // len=70 > 2D: закрыть «пустое» окно выгоднее, но пустых документов нет
        let docs = run(
            WindowMode::NoOverlap,
            30.0,
            &[seg(0.0, 70.0, "long"), seg(70.0, 75.0, "tail")],
        );
        assert!(docs.iter().all(|d| !d.text.is_empty()));
        assert_eq!(docs[0].start_time, 0.0);
        assert_eq!(docs.last().unwrap().end_time, 75.0);
    }

    #[test]
    fn no_overlap_windows_tile_the_timeline() {
        let mut t = 0.0;
        let segs: Vec<_> = (0..50)
            .map(|_| {
                let start = t;
                t += 7.3;
                seg(start, t, "w")
            })
            .collect();
        let docs = run(WindowMode::NoOverlap, 30.0, &segs);
        assert_eq!(docs[0].start_time, segs[0].start_time);
        assert_eq!(docs.last().unwrap().end_time, segs.last().unwrap().end_time);
        for pair in docs.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time, "gap or overlap");
        }
    }

    #[test]
    fn sliding_keeps_tail_as_overlap() {
        let segs: Vec<_> = (0..8)
            .map(|i| seg(i as f64 * 10.0, (i + 1) as f64 * 10.0, &format!("s{i}")))
            .collect();
        let docs = run(WindowMode::SlidingOverlap, 30.0, &segs);
        assert_eq!(docs[0].start_time, 0.0);
        // соседние окна пересекаются
        for pair in docs.windows(2) {
            assert!(pair[1].start_time < pair[0].end_time, "{:?}", spans(&docs));
        }
        assert_eq!(docs.last().unwrap().end_time, 80.0);
        // каждый сегмент попал хотя бы в одно окно
        for i in 0..8 {
            let t = format!("s{i}");
            assert!(docs.iter().any(|d| d.text.split(' ').any(|w| w == t)), "lost {t}");
        }
    }

    #[test]
    fn sliding_first_window_matches_no_overlap() {
        let segs: Vec<_> = (0..8)
            .map(|i| seg(i as f64 * 10.0, (i + 1) as f64 * 10.0, &format!("s{i}")))
            .collect();
        let sliding = run(WindowMode::SlidingOverlap, 30.0, &segs);
        assert_eq!((sliding[0].start_time, sliding[0].end_time), (0.0, 40.0));
        assert_eq!(sliding[0].text, "s0 s1 s2 s3");
        // после закрытия остаются сегменты, укладывающиеся в D от конца: s1..s3
        assert_eq!(sliding[1].start_time, 10.0);
    }

    #[test]
    fn sliding_long_segment_seeds_next_window() {
        let segs = vec![
            seg(0.0, 30.0, "a"),
            seg(30.0, 50.0, "long"),
            seg(50.0, 52.0, "c"),
        ];
        let docs = run(WindowMode::SlidingOverlap, 30.0, &segs);
        assert_eq!(docs[0].text, "a");
        assert_eq!(spans(&docs)[0], (0.0, 30.0));
        let last = docs.last().unwrap();
        assert!(last.text.contains("long") && last.text.contains('c'));
        assert_eq!(last.end_time, 52.0);
    }

    #[test]
    fn sliding_emits_retained_tail() {
        // b закрыл окно [0,40]; после обрезки в очереди остаётся b, он уходит хвостом
        let segs = vec![seg(0.0, 30.0, "a"), seg(30.0, 40.0, "b")];
        let docs = run(WindowMode::SlidingOverlap, 30.0, &segs);
        let got: Vec<(f64, f64, &str)> = docs
            .iter()
            .map(|d| (d.start_time, d.end_time, d.text.as_str()))
            .collect();
        assert_eq!(got, vec![(0.0, 40.0, "a b"), (30.0, 40.0, "b")]);
        assert_ne!(docs[0].id, docs[1].id);
    }

    #[test]
    fn sliding_merge_threshold_is_inclusive() {
        let merged = run(
            WindowMode::SlidingOverlap,
            30.0,
            &[seg(0.0, 30.0, "a"), seg(30.0, 45.0, "b")],
        );
        assert_eq!(merged[0].text, "a b");
        assert_eq!(spans(&merged)[0], (0.0, 45.0));

        // 15.01 > порога: окно закрывается без b, b начинает следующее
        let split = run(
            WindowMode::SlidingOverlap,
            30.0,
            &[seg(0.0, 30.0, "a"), seg(30.0, 45.01, "b")],
        );
        assert_eq!(split[0].text, "a");
        assert_eq!(spans(&split)[0], (0.0, 30.0));
        assert_eq!(split.last().unwrap().text, "b");
        assert_eq!(split.last().unwrap().end_time, 45.01);
    }

    #[test]
    fn half_text_borrows_next_segment_prefix() {
        let segs = vec![
            seg(0.0, 30.0, "first window text"),
            seg(30.0, 50.0, "alpha beta gamma delta"),
        ];
        // 20 > 15 -> второй сегмент начинает новое окно, первому достаётся половина
        let docs = run(WindowMode::HalfTextOverlap, 30.0, &segs);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "first window text alpha beta gamma");
        assert_eq!(docs[0].end_time, 40.0);
        // последнему окну занимать не у кого
        assert_eq!(docs[1].text, "alpha beta gamma delta");
        assert_eq!(docs[1].end_time, 50.0);
    }

    #[test]
    fn half_text_without_space_borrows_nothing() {
        let segs = vec![seg(0.0, 30.0, "a"), seg(30.0, 50.0, "supercalifragilistic")];
        let docs = run(WindowMode::HalfTextOverlap, 30.0, &segs);
        assert_eq!(docs[0].text, "a");
        assert_eq!(docs[0].end_time, 30.0);
    }

    #[test]
    fn documents_carry_deterministic_ids() {
        let segs: Vec<_> = (0..20)
            .map(|i| seg(i as f64 * 4.0, (i + 1) as f64 * 4.0, "x y"))
            .collect();
        let a = run(WindowMode::NoOverlap, 30.0, &segs);
        let b = run(WindowMode::NoOverlap, 30.0, &segs);
        assert_eq!(a, b);
        for d in &a {
            assert_eq!(
                d.id,
                crate::doc_id::document_id("show", "ep", d.start_time, d.end_time)
            );
            assert!(d.start_time <= d.end_time);
        }
    }
}
