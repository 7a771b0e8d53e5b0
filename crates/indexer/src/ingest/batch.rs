use podgrep_segment::Document;

/// Буфер документов до очередного bulk-сброса. Владелец: драйвер, один на прогон.
#[derive(Debug)]
pub struct Batch {
    docs: Vec<Document>,
    cap: usize,
}

impl Batch {
    pub fn with_cap(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { docs: Vec::with_capacity(cap), cap }
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn is_full(&self) -> bool { self.docs.len() >= self.cap }

    pub fn cap(&self) -> usize { self.cap }

    /// Добавить документ; true: батч заполнен и его пора сбрасывать.
    pub fn push(&mut self, doc: Document) -> bool {
        self.docs.push(doc);
        self.is_full()
    }

    /// Забрать содержимое, оставив пустой буфер той же ёмкости.
    pub fn take(&mut self) -> Vec<Document> {
        std::mem::replace(&mut self.docs, Vec::with_capacity(self.cap))
    }
}
