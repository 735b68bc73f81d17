use regionalloc::{Config, GlobalAllocator};

const CONFIG: &str = r#"
[region]
start = 4096
size = 16384
"#;

/// A singly linked list node as stored in the region: `next` address, value.
const WORD: usize = core::mem::size_of::<usize>();
const NODE_SIZE: usize = 2 * WORD;

struct LinkedList {
  head: Option<usize>,
  len: usize,
}

fn read_node(
  heap: &GlobalAllocator,
  node: usize,
) -> (Option<usize>, usize) {
  let data = heap.data(node).expect("node is a live block");
  let next = usize::from_ne_bytes(data[..WORD].try_into().unwrap());
  let value = usize::from_ne_bytes(data[WORD..NODE_SIZE].try_into().unwrap());
  ((next != 0).then_some(next), value)
}

fn set_next(
  heap: &mut GlobalAllocator,
  node: usize,
  next: Option<usize>,
) {
  let data = heap.data_mut(node).expect("node is a live block");
  data[..WORD].copy_from_slice(&next.unwrap_or(0).to_ne_bytes());
}

impl LinkedList {
  fn append(
    &mut self,
    heap: &mut GlobalAllocator,
    value: usize,
  ) -> bool {
    let Some(node) = heap.allocate(NODE_SIZE) else {
      eprintln!("Failed to allocate node for {value}");
      return false;
    };
    heap.data_mut(node).unwrap()[WORD..NODE_SIZE].copy_from_slice(&value.to_ne_bytes());

    match self.nodes(heap).last().copied() {
      Some(last) => set_next(heap, last, Some(node)),
      None => self.head = Some(node),
    }
    self.len += 1;
    true
  }

  fn remove(
    &mut self,
    heap: &mut GlobalAllocator,
    index: usize,
  ) -> Option<usize> {
    let nodes = self.nodes(heap);
    let node = *nodes.get(index)?;
    let (next, value) = read_node(heap, node);

    match index.checked_sub(1) {
      Some(prev) => set_next(heap, nodes[prev], next),
      None => self.head = next,
    }
    heap.release(node);
    self.len -= 1;
    Some(value)
  }

  fn nodes(
    &self,
    heap: &GlobalAllocator,
  ) -> Vec<usize> {
    let mut nodes = Vec::with_capacity(self.len);
    let mut cursor = self.head;
    while let Some(node) = cursor {
      nodes.push(node);
      cursor = read_node(heap, node).0;
    }
    nodes
  }

  fn print(
    &self,
    heap: &GlobalAllocator,
  ) {
    let rendered: Vec<String> = self
      .nodes(heap)
      .into_iter()
      .map(|node| format!("Node({})", read_node(heap, node).1))
      .collect();
    println!("{}", rendered.join("->"));
  }
}

fn main() {
  let config = Config::from_toml_str(CONFIG).expect("demo config parses");
  let mut heap = GlobalAllocator::from_config(&config.region).expect("demo region is valid");

  println!(
    "Region [{:#x}, {:#x}), {} bytes",
    heap.start(),
    heap.end(),
    heap.capacity()
  );

  let mut list = LinkedList { head: None, len: 0 };

  // --------------------------------------------------------------------
  // 1) Append ten nodes. Each one is a block with a header in front.
  // --------------------------------------------------------------------
  for value in 1..=10 {
    if list.append(&mut heap, value) {
      println!("Appended number: {value}");
    }
  }
  list.print(&heap);

  // --------------------------------------------------------------------
  // 2) Remove two nodes, leaving two gaps in the region.
  // --------------------------------------------------------------------
  for index in [4, 0] {
    if let Some(value) = list.remove(&mut heap, index) {
      println!("Removed item: {value}");
    }
  }

  // --------------------------------------------------------------------
  // 3) Append again: first-fit places the node in the earliest gap.
  // --------------------------------------------------------------------
  if list.append(&mut heap, 30) {
    println!("Appended number: 30");
  }
  list.print(&heap);

  for block in heap.blocks() {
    println!(
      "  block at {:#x}: {} bytes ({} usable, {} padding)",
      block.header,
      block.size,
      block.usable(),
      block.padding
    );
  }
}
