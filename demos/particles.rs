use bytemuck::{Pod, Zeroable};
use rand::{Rng, SeedableRng, rngs::StdRng};
use regionalloc::{Pool, SystemAllocator};

const MAX_PARTICLES: usize = 100;
const BASE_LIFETIME: f32 = 1.05;
const FRAMES: usize = 240;
const DT: f32 = 1.0 / 60.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Particle {
  pos: [f32; 2],
  vel: [f32; 2],
  lifetime: f32,
}

struct ParticleSystem {
  pool: Pool<SystemAllocator>,
  alive: Vec<usize>,
  rng: StdRng,
}

impl ParticleSystem {
  fn spawn(&mut self) {
    let Some(item) = self.pool.request() else {
      return;
    };
    let particle = Particle {
      pos: [
        400.0 + self.rng.gen_range(-10.0_f32..10.0),
        427.0 + self.rng.gen_range(-10.0_f32..10.0),
      ],
      vel: [
        self.rng.gen_range(-100.0_f32..100.0),
        -100.0 - self.rng.gen_range(-10.0_f32..300.0),
      ],
      lifetime: BASE_LIFETIME + self.rng.gen_range(-0.1_f32..0.1),
    };
    self.pool.write(item, &particle).expect("particle fits its slot");
    self.alive.push(item);
  }

  fn update(
    &mut self,
    dt: f32,
  ) {
    for index in (0..self.alive.len()).rev() {
      let item = self.alive[index];
      let mut particle: Particle = self.pool.read(item).expect("alive particle");
      particle.pos[0] += particle.vel[0] * dt;
      particle.pos[1] += particle.vel[1] * dt;
      particle.lifetime -= dt;

      if particle.lifetime <= 0.0 {
        self.pool.release(item).expect("alive particle is in use");
        self.alive.swap_remove(index);
      } else {
        self.pool.write(item, &particle).expect("particle fits its slot");
      }
    }

    self.spawn();
  }
}

fn main() {
  let pool = Pool::init_with_allocator(
    core::mem::size_of::<Particle>(),
    MAX_PARTICLES,
    SystemAllocator::new(),
  )
  .expect("pool allocation");
  println!("Pool allocated with a capacity for {} items", pool.capacity());

  let mut system = ParticleSystem {
    pool,
    alive: Vec::with_capacity(MAX_PARTICLES),
    rng: StdRng::seed_from_u64(0x9E37_79B9),
  };

  for frame in 1..=FRAMES {
    system.update(DT);
    if frame % 60 == 0 {
      println!(
        "frame {frame}: {} alive, {} free slots",
        system.pool.count_used_nodes(),
        system.pool.count_free_nodes()
      );
    }
  }

  match system.pool.deinit() {
    Ok(_) => println!("Pool released"),
    Err(err) => eprintln!("Failed to release pool: {err}"),
  }
}
